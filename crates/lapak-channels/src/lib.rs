//! # lapak-channels
//!
//! Messaging platform integrations. Currently one: WhatsApp over the
//! WhatsApp Web protocol.

pub mod whatsapp;
