//! News record storage port.

use crate::domain::error::NewsdeskError;
use crate::domain::news::{NewsBatch, NewsItem};
use std::path::Path;

pub trait NewsPort {
    fn load(&self, path: &Path) -> Result<NewsBatch, NewsdeskError>;

    fn save(&self, items: &[NewsItem], path: &Path) -> Result<(), NewsdeskError>;
}
