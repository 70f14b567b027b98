//! Source host decorator that serves expanded code.
//!
//! The host analysis service reads files through [`ExpandingSourceHost`]:
//!
//! 1. virtual declaration units are answered from the registry;
//! 2. expandable files are answered with their expanded code;
//! 3. everything else falls through to the real source host.

use std::sync::Arc;

use url::Url;

use super::service::SourceHost;
use crate::expansion::ContentVersion;
use crate::session::ExpansionSession;

pub struct ExpandingSourceHost {
    session: Arc<ExpansionSession>,
}

impl ExpandingSourceHost {
    pub fn new(session: Arc<ExpansionSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<ExpansionSession> {
        &self.session
    }

    /// Bring the owner of a virtual unit up to date so the unit reflects the
    /// owner's current content.
    fn refresh_owner_of(&self, name: &Url) {
        if let Some(owner) = self.session.registry().owner_of(name) {
            self.session.entry_for(&owner);
        }
    }
}

impl SourceHost for ExpandingSourceHost {
    fn file_names(&self) -> Vec<Url> {
        let mut names = self.session.sources().file_names();
        for name in self.session.registry().names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn file_exists(&self, file: &Url) -> bool {
        self.session.registry().has(file) || self.session.sources().file_exists(file)
    }

    fn content(&self, file: &Url) -> Option<String> {
        if self.session.registry().has(file) {
            self.refresh_owner_of(file);
            return self
                .session
                .registry()
                .content_of(file)
                .map(|content| content.to_string());
        }
        match self.session.entry_for(file) {
            Some(entry) => Some(entry.code.clone()),
            None => self.session.sources().content(file),
        }
    }

    fn version(&self, file: &Url) -> Option<ContentVersion> {
        if self.session.registry().has(file) {
            self.refresh_owner_of(file);
            return self
                .session
                .registry()
                .version_of(file)
                .map(|version| self.session.expanded_version(&version));
        }
        match self.session.entry_for(file) {
            Some(entry) => Some(self.session.expanded_version(&entry.version)),
            None => self.session.sources().version(file),
        }
    }
}
