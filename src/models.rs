/// One `<page>` record as reconstructed from the dump.
///
/// Missing children are not errors: an absent `<title>` or `<revision><text>`
/// leaves the field empty, an absent `<redirect>` leaves `redirect` as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WikiPage {
    pub title: String,
    /// Target from `<redirect title="..."/>`; only its presence affects filtering
    pub redirect: Option<String>,
    pub text: String,
}

impl WikiPage {
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}
