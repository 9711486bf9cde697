use super::normalize::SalesRow;

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_REFUNDED: &str = "refunded";
pub const CUSTOMER_RETURNING: &str = "returning";
pub const CUSTOMER_NEW: &str = "new";
pub const PAYMENT_ADDI: &str = "addi";
pub const SUBTYPE_SHOP: &str = "shop";

/// Named row filters. Membership only looks at normalized fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Completed,
    Refunded,
    ReturningCompleted,
    NewCompleted,
    AddiTotal,
    AddiShop,
    /// Addi with an empty sub-type (not "anything but shop")
    AddiNormal,
}

impl SegmentKind {
    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::Completed => "completed",
            SegmentKind::Refunded => "refunded",
            SegmentKind::ReturningCompleted => "returning_completed",
            SegmentKind::NewCompleted => "new_completed",
            SegmentKind::AddiTotal => "addi_total",
            SegmentKind::AddiShop => "addi_shop",
            SegmentKind::AddiNormal => "addi_normal",
        }
    }

    pub fn contains(self, row: &SalesRow) -> bool {
        match self {
            SegmentKind::Completed => row.status == STATUS_COMPLETED,
            SegmentKind::Refunded => row.status == STATUS_REFUNDED,
            SegmentKind::ReturningCompleted => {
                SegmentKind::Completed.contains(row) && row.customer_type == CUSTOMER_RETURNING
            }
            SegmentKind::NewCompleted => {
                SegmentKind::Completed.contains(row) && row.customer_type == CUSTOMER_NEW
            }
            SegmentKind::AddiTotal => {
                SegmentKind::Completed.contains(row) && row.payment_method == PAYMENT_ADDI
            }
            SegmentKind::AddiShop => {
                SegmentKind::AddiTotal.contains(row) && row.payment_subtype == SUBTYPE_SHOP
            }
            SegmentKind::AddiNormal => {
                SegmentKind::AddiTotal.contains(row) && row.payment_subtype.is_empty()
            }
        }
    }
}

/// Borrowed view over the rows matching one [`SegmentKind`], in row order
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    kind: SegmentKind,
    rows: Vec<&'a SalesRow>,
}

impl<'a> Segment<'a> {
    pub fn select(kind: SegmentKind, rows: &'a [SalesRow]) -> Self {
        Self {
            kind,
            rows: rows.iter().filter(|r| kind.contains(r)).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SalesRow> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every segment the report uses, recomputed from the full row set
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    pub completed: Segment<'a>,
    pub refunded: Segment<'a>,
    pub returning: Segment<'a>,
    pub new: Segment<'a>,
    pub addi_total: Segment<'a>,
    pub addi_shop: Segment<'a>,
    pub addi_normal: Segment<'a>,
}

impl<'a> Segments<'a> {
    pub fn build(rows: &'a [SalesRow]) -> Self {
        Self {
            completed: Segment::select(SegmentKind::Completed, rows),
            refunded: Segment::select(SegmentKind::Refunded, rows),
            returning: Segment::select(SegmentKind::ReturningCompleted, rows),
            new: Segment::select(SegmentKind::NewCompleted, rows),
            addi_total: Segment::select(SegmentKind::AddiTotal, rows),
            addi_shop: Segment::select(SegmentKind::AddiShop, rows),
            addi_normal: Segment::select(SegmentKind::AddiNormal, rows),
        }
    }
}
