mod emails;
mod health_check;
mod helpers;
mod incidents;
mod responses;
mod status;
