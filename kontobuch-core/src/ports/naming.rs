//! Naming port - asks for a display name when an account is first seen

/// Source of display names for newly created accounts
pub trait AccountNamer {
    /// Name for the account with the given number; `None` or a blank
    /// answer leaves the placeholder name in place
    fn prompt_for_account_name(&self, suggested_number: &str) -> Option<String>;
}

/// Namer for non-interactive runs, never supplies a name
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessNamer;

impl AccountNamer for HeadlessNamer {
    fn prompt_for_account_name(&self, _suggested_number: &str) -> Option<String> {
        None
    }
}

impl<F> AccountNamer for F
where
    F: Fn(&str) -> Option<String>,
{
    fn prompt_for_account_name(&self, suggested_number: &str) -> Option<String> {
        self(suggested_number)
    }
}
