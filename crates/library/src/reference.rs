use shelf_storage::CoverRef;
use uuid::Uuid;

/// Source of fresh blob references for new covers.
pub trait ReferenceGenerator: Send + Sync {
    fn create(&self) -> CoverRef;
}

/// `$` followed by a random UUID without hyphens. The prefix keeps
/// references visually distinct from content addresses.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomReferences;

impl ReferenceGenerator for RandomReferences {
    fn create(&self) -> CoverRef {
        CoverRef::new(format!("${}", Uuid::new_v4().simple()))
    }
}
