pub mod u508_load_sales_export;
