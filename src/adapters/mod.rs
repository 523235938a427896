// Adapters layer: concrete implementations for external systems (catalog, webhook, storage).

pub mod scryfall;
pub mod storage;
pub mod webhook;
