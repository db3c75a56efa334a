//! Business logic services

pub mod borrowers;
pub mod catalog;
pub mod lending;

use crate::repository::SharedStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowerService,
    pub lending: lending::LendingService,
    pub store: SharedStore,
}

impl Services {
    /// Create all services over the given ledger store
    pub fn new(store: SharedStore) -> Self {
        let catalog = catalog::CatalogService::new(store.clone());
        let borrowers = borrowers::BorrowerService::new(store.clone());
        let lending =
            lending::LendingService::new(store.clone(), catalog.clone(), borrowers.clone());

        Self {
            catalog,
            borrowers,
            lending,
            store,
        }
    }
}
