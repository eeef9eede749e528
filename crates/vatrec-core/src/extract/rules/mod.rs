//! Per-field recognizers for receipt text.

pub mod amounts;
pub mod company;
pub mod dates;
pub mod patterns;
pub mod tax_id;

pub use amounts::{extract_amounts, Amounts};
pub use company::CompanyExtractor;
pub use dates::DateResolver;
pub use tax_id::TaxIdExtractor;
