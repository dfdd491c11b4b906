use std::sync::Arc;

use crate::admission::{AdmissionManager, RedemptionHandler};
use crate::auth::{CredentialIssuer, CredentialRefresher, Gatekeeper, TokenCodec};
use crate::store::{OrganizerStore, ParticipantStore, RegistrationStore, Store, TicketStore};

#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<CredentialIssuer>,
    pub refresher: Arc<CredentialRefresher>,
    pub gatekeeper: Arc<Gatekeeper>,
    pub admission: Arc<AdmissionManager>,
    pub redemption: Arc<RedemptionHandler>,
    pub organizers: Arc<dyn OrganizerStore>,
    pub participants: Arc<dyn ParticipantStore>,
    pub registrations: Arc<dyn RegistrationStore>,
    pub tickets: Arc<dyn TicketStore>,
}

impl AppState {
    /// Wires every service over one backing store and one token codec.
    pub fn new<S>(store: S, codec: TokenCodec) -> Self
    where
        S: Store + 'static,
    {
        let store = Arc::new(store);
        let codec = Arc::new(codec);

        let organizers: Arc<dyn OrganizerStore> = store.clone();
        let participants: Arc<dyn ParticipantStore> = store.clone();
        let registrations: Arc<dyn RegistrationStore> = store.clone();
        let tickets: Arc<dyn TicketStore> = store;

        Self {
            issuer: Arc::new(CredentialIssuer::new(organizers.clone(), codec.clone())),
            refresher: Arc::new(CredentialRefresher::new(organizers.clone(), codec.clone())),
            gatekeeper: Arc::new(Gatekeeper::new(organizers.clone(), codec)),
            admission: Arc::new(AdmissionManager::new(
                registrations.clone(),
                tickets.clone(),
            )),
            redemption: Arc::new(RedemptionHandler::new(
                registrations.clone(),
                tickets.clone(),
            )),
            organizers,
            participants,
            registrations,
            tickets,
        }
    }
}
