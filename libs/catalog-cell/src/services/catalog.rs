// libs/catalog-cell/src/services/catalog.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::store::{CatalogStore, UserStore};
use shared_database::{AppState, StoreError};
use shared_models::catalog::{DentistServiceOffering, Service, ServiceCategory, ServiceChanges};
use shared_models::pagination::{Page, Pagination};
use shared_models::user::Role;

use crate::models::{
    validate_duration, validate_name, validate_price, AssignServiceRequest, CatalogError,
    CreateServiceRequest, OfferedService, UpdateServiceRequest,
};

pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    users: Arc<dyn UserStore>,
}

impl CatalogService {
    pub fn new(state: &AppState) -> Self {
        Self {
            catalog: Arc::clone(&state.catalog),
            users: Arc::clone(&state.users),
        }
    }

    // ==============================================================================
    // SERVICES
    // ==============================================================================

    /// Newest first, optionally restricted to one category.
    pub async fn list_services(
        &self,
        category: Option<ServiceCategory>,
        active_only: bool,
        page: Page,
    ) -> Result<(Vec<Service>, Pagination), CatalogError> {
        let mut services: Vec<Service> = self
            .catalog
            .list_services(active_only)
            .await?
            .into_iter()
            .filter(|s| category.map_or(true, |c| s.category == c))
            .collect();
        services.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let pagination = Pagination::new(page, services.len() as u64);
        let items = services.into_iter().skip(page.offset()).take(page.limit()).collect();
        debug!("Listed services page {} (total {})", page.page, pagination.total);
        Ok((items, pagination))
    }

    pub async fn get_service(&self, id: Uuid) -> Result<Service, CatalogError> {
        self.catalog.get_service(id).await?.ok_or(CatalogError::ServiceNotFound)
    }

    pub async fn create_service(&self, request: CreateServiceRequest) -> Result<Service, CatalogError> {
        validate_name(&request.name)?;
        validate_duration(request.default_duration)?;
        validate_price(request.default_price)?;

        let name = request.name.trim().to_string();
        if self.catalog.find_service_by_name(&name).await?.is_some() {
            return Err(CatalogError::NameTaken);
        }

        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4(),
            name,
            description: request.description,
            category: request.category,
            default_duration: request.default_duration,
            default_price: request.default_price,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created = self.catalog.insert_service(service).await.map_err(name_conflict)?;
        info!("Created service {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn update_service(&self, id: Uuid, request: UpdateServiceRequest) -> Result<Service, CatalogError> {
        if let Some(name) = &request.name {
            validate_name(name)?;
            if let Some(existing) = self.catalog.find_service_by_name(name.trim()).await? {
                if existing.id != id {
                    return Err(CatalogError::NameTaken);
                }
            }
        }
        if let Some(duration) = request.default_duration {
            validate_duration(duration)?;
        }
        if let Some(price) = request.default_price {
            validate_price(price)?;
        }

        let changes = ServiceChanges {
            name: request.name.map(|n| n.trim().to_string()),
            description: request.description,
            category: request.category,
            default_duration: request.default_duration,
            default_price: request.default_price,
            is_active: request.is_active,
        };

        let updated = self
            .catalog
            .update_service(id, &changes)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => CatalogError::ServiceNotFound,
                other => name_conflict(other),
            })?;
        info!("Updated service {}", id);
        Ok(updated)
    }

    pub async fn delete_service(&self, id: Uuid) -> Result<(), CatalogError> {
        self.get_service(id).await?;

        let assigned = self.catalog.count_offerings_for_service(id).await?;
        if assigned > 0 {
            warn!("Refusing to delete service {} assigned to {} dentist(s)", id, assigned);
            return Err(CatalogError::ServiceInUse);
        }

        self.catalog.delete_service(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => CatalogError::ServiceNotFound,
            other => CatalogError::Store(other),
        })?;
        info!("Deleted service {}", id);
        Ok(())
    }

    // ==============================================================================
    // DENTIST OFFERINGS
    // ==============================================================================

    pub async fn assign_to_dentist(&self, request: AssignServiceRequest) -> Result<OfferedService, CatalogError> {
        self.ensure_dentist(request.dentist_id).await?;
        let service = self.get_service(request.service_id).await?;

        if let Some(duration) = request.custom_duration {
            validate_duration(duration)?;
        }
        if let Some(price) = request.custom_price {
            validate_price(price)?;
        }

        if self
            .catalog
            .get_dentist_service_offering(request.dentist_id, request.service_id)
            .await?
            .is_some()
        {
            return Err(CatalogError::AlreadyAssigned);
        }

        let offering = DentistServiceOffering {
            id: Uuid::new_v4(),
            dentist_id: request.dentist_id,
            service_id: service.id,
            custom_price: Some(request.custom_price.unwrap_or(service.default_price)),
            custom_duration: Some(request.custom_duration.unwrap_or(service.default_duration)),
            is_active: true,
            created_at: Utc::now(),
        };

        let created = self.catalog.insert_offering(offering).await.map_err(|e| match e {
            StoreError::Conflict(_) => CatalogError::AlreadyAssigned,
            other => CatalogError::Store(other),
        })?;
        info!("Assigned service {} to dentist {}", service.id, request.dentist_id);
        Ok(OfferedService::new(&created, &service))
    }

    /// Every offering of a dentist joined with its catalog entry, newest first.
    /// Offerings whose service has since disappeared are skipped.
    pub async fn offerings_for_dentist(&self, dentist_id: Uuid) -> Result<Vec<OfferedService>, CatalogError> {
        let offerings = self.catalog.list_offerings_for_dentist(dentist_id).await?;
        let services: HashMap<Uuid, Service> = self
            .catalog
            .list_services(false)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(offerings
            .iter()
            .filter_map(|o| services.get(&o.service_id).map(|s| OfferedService::new(o, s)))
            .collect())
    }

    pub async fn dentist_services(
        &self,
        dentist_id: Uuid,
        page: Page,
    ) -> Result<(Vec<OfferedService>, Pagination), CatalogError> {
        self.ensure_dentist(dentist_id).await?;

        let offered = self.offerings_for_dentist(dentist_id).await?;
        let pagination = Pagination::new(page, offered.len() as u64);
        let items = offered.into_iter().skip(page.offset()).take(page.limit()).collect();
        Ok((items, pagination))
    }

    pub async fn remove_from_dentist(&self, dentist_id: Uuid, service_id: Uuid) -> Result<(), CatalogError> {
        self.catalog
            .delete_offering(dentist_id, service_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => CatalogError::AssignmentNotFound,
                other => CatalogError::Store(other),
            })?;
        info!("Removed service {} from dentist {}", service_id, dentist_id);
        Ok(())
    }

    async fn ensure_dentist(&self, dentist_id: Uuid) -> Result<(), CatalogError> {
        match self.users.find_user_by_id(dentist_id).await? {
            Some(user) if user.role == Role::Dentist => Ok(()),
            _ => Err(CatalogError::DentistNotFound),
        }
    }
}

fn name_conflict(err: StoreError) -> CatalogError {
    match err {
        StoreError::Conflict(_) => CatalogError::NameTaken,
        other => CatalogError::Store(other),
    }
}
