//! Storage access.

pub mod storage {
    pub use crate::storage::*;
}

pub mod db {
    pub use crate::db::*;
}
