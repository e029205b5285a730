pub mod limits;
pub mod request;
pub mod response;
pub mod status;
