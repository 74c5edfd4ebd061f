use crate::StoreError;
use agora_types::ParamChange;

/// Key/value store of governable parameters, grouped by subspace.
pub trait ParamStore {
    fn get_param(&self, subspace: &str, key: &str) -> Result<Option<String>, StoreError>;

    fn set_param(&self, subspace: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Apply every change or none of them.
    fn set_params(&self, changes: &[ParamChange]) -> Result<(), StoreError>;
}
