pub mod principal;

pub use principal::{SUPERUSER_HEADER, USER_ID_HEADER};
