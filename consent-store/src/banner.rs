// consent-store/src/banner.rs
use common::models::consent::{ConsentChoice, ConsentType};
use crate::store::ConsentStore;
use crate::tracking::PageVisit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerState {
    Hidden,
    Shown,
}

/// The only two choices the banner offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerAction {
    AcceptNecessary,
    RejectAll,
}

impl BannerAction {
    pub const ALL: [BannerAction; 2] = [BannerAction::AcceptNecessary, BannerAction::RejectAll];

    pub fn label(&self) -> &'static str {
        match self {
            BannerAction::AcceptNecessary => "Accept Necessary Only",
            BannerAction::RejectAll => "Reject All",
        }
    }
}

/// Lifecycle of the consent banner for one page
#[derive(Debug)]
pub struct ConsentBanner {
    state: BannerState,
}

impl Default for ConsentBanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsentBanner {
    pub fn new() -> Self {
        Self {
            state: BannerState::Hidden,
        }
    }

    pub fn state(&self) -> BannerState {
        self.state
    }

    /// Show the banner if no decision is on record; otherwise resume tracking
    pub fn on_page_load(&mut self, store: &mut ConsentStore, visit: &PageVisit) -> BannerState {
        if store.has_consent() {
            if store.consent_type() == ConsentType::NecessaryOnly {
                store.provision_necessary_cookies();
                store.init_tracking(visit);
            }
            self.state = BannerState::Hidden;
        } else {
            self.state = BannerState::Shown;
        }
        self.state
    }

    /// Apply a banner choice. Returns false when the banner is not showing.
    pub fn choose(&mut self, action: BannerAction, store: &mut ConsentStore, visit: &PageVisit) -> bool {
        if self.state != BannerState::Shown {
            tracing::debug!("Ignoring {:?}, consent banner is not shown", action);
            return false;
        }

        match action {
            BannerAction::AcceptNecessary => {
                store.save_consent(ConsentChoice::NecessaryOnly);
                store.init_tracking(visit);
            }
            BannerAction::RejectAll => store.save_consent(ConsentChoice::Rejected),
        }
        self.state = BannerState::Hidden;
        true
    }

    /// Withdraw consent and ask again
    pub fn revoke(&mut self, store: &mut ConsentStore) {
        store.revoke_consent();
        self.state = BannerState::Shown;
    }
}
