//! Data models for CampusHive

pub mod course;
pub mod coursework;
pub mod department;
pub mod equipment;
pub mod import_report;
pub mod repair;
pub mod user;
pub mod venue;

pub use course::{Class, Course, Enrollment};
pub use equipment::{BorrowingRecord, Equipment, EquipmentCategory, EquipmentStatus};
pub use repair::{RepairRequest, RepairStatus};
pub use user::{CurrentUser, Role, User};
pub use venue::{Venue, VenueBooking};

/// Default page size for list endpoints
pub const DEFAULT_PER_PAGE: i64 = 10;
/// Upper bound on page size
pub const MAX_PER_PAGE: i64 = 100;
/// Highest page number accepted; larger requests read an empty page
pub const MAX_PAGE: i64 = 1_000_000;

/// Normalized LIMIT/OFFSET window for paginated queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Stores a string-backed enum in a TEXT column.
///
/// The type must provide `as_str()` and a `FromStr` impl with `Err = String`.
macro_rules! impl_text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

pub(crate) use impl_text_column;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        let w = PageWindow::new(None, None);
        assert_eq!(w.page, 1);
        assert_eq!(w.per_page, DEFAULT_PER_PAGE);
        assert_eq!(w.offset(), 0);
    }

    #[test]
    fn test_page_window_clamps() {
        let w = PageWindow::new(Some(0), Some(1000));
        assert_eq!(w.page, 1);
        assert_eq!(w.per_page, MAX_PER_PAGE);

        let w = PageWindow::new(Some(3), Some(10));
        assert_eq!(w.offset(), 20);
    }

    #[test]
    fn test_page_window_huge_page() {
        let w = PageWindow::new(Some(i64::MAX), Some(MAX_PER_PAGE));
        assert_eq!(w.page, MAX_PAGE);
        assert_eq!(w.offset(), (MAX_PAGE - 1) * MAX_PER_PAGE);
    }
}
