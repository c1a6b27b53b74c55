//! Transfer Service - accounts, top-ups and transfers behind access-token auth.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
