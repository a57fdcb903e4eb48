//! foliobot — conversational onboarding engine for portfolio building.

pub mod builder;
pub mod config;
pub mod convo;
pub mod error;
pub mod github;
pub mod messenger;
pub mod store;
pub mod webhook;
