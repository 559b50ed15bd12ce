pub mod cancel;
pub mod registration;
pub mod validator;

pub use crate::domain::model::{
    Card, CardData, CardRegistration, CardType, PreRegistration, ProcessorToken,
    TokenizedRegistration,
};
pub use crate::domain::ports::{ConfigProvider, HttpMethod, HttpResponse, Transport};
pub use crate::utils::error::Result;
