// Pipeline stages and shared errors/models
pub mod pipeline {
    pub use crate::assembler::assemble;
    pub use crate::classifier::classify;
    pub use crate::intake::IntakePipeline;
    pub use crate::normalizer::normalize;
    pub use crate::schema::validate;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
