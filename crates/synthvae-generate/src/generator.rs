use synthvae_core::{RoleTable, Table};

use crate::errors::GenerationError;

/// Anything that can produce a synthetic table shaped like a real one.
///
/// Implementations return exactly the columns listed in `roles`, in that
/// order, with `rows` rows.
pub trait SyntheticGenerator {
    /// Stable identifier recorded in generation reports.
    fn name(&self) -> &str;

    fn generate(
        &self,
        real: &Table,
        rows: usize,
        roles: &RoleTable,
    ) -> Result<Table, GenerationError>;
}
