pub mod calendar;
pub mod checkout;
pub mod conflict;
pub mod dates;
pub mod price_table;
pub mod pricing;
pub mod profile;
pub mod property;
pub mod reservation;
pub mod selection;
pub mod session;
