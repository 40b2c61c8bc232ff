//! Account Module - Account-info API collaborator
//!
//! # Components
//! - `profile.rs`: lenient payload parsing, profile-link handling
//! - `client.rs`: HTTP lookup against the profile-info service

pub mod profile;
pub mod client;

pub use profile::{username_from_profile_url, AccountProfile};
pub use client::{AccountApiConfig, AccountInfoClient, AccountLookup};
