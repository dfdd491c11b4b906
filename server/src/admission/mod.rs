pub mod manager;
pub mod redemption;

pub use manager::{
    generate_redemption_token, Admission, AdmissionManager, RegistrationRequest, TicketIssuance,
};
pub use redemption::{Redemption, RedemptionHandler};
