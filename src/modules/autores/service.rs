use std::sync::Arc;


use super::models::AuthorResponse;
use crate::entities::{self, Author, AuthorData};
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::storage::{AuthorStore, Visibility};

const RESOURCE: &str = "Autor";

/// Author business rules
#[derive(Clone)]
pub struct AuthorService {
    authors: Arc<dyn AuthorStore>,
}

impl AuthorService {
    pub fn new(authors: Arc<dyn AuthorStore>) -> Self {
        Self { authors }
    }

    /// Register a new active author. The name pair must be unused by every
    /// author, deactivated ones included.
    pub async fn create(&self, data: AuthorData) -> Result<AuthorResponse, ServiceError> {
        if self.authors.exists_by_name(&data.nombre, &data.apellido).await? {
            return Err(ServiceError::duplicate(
                RESOURCE,
                format!("{} {}", data.nombre, data.apellido),
            ));
        }

        let author = self.authors.insert(data).await?;
        tracing::info!(author_id = author.id(), "author created");
        Ok(AuthorResponse::from(&author))
    }

    /// Any author by id, deactivated or not
    pub async fn get_by_id(&self, id: i64) -> Result<AuthorResponse, ServiceError> {
        let author = self.find(id).await?;
        Ok(AuthorResponse::from(&author))
    }

    pub async fn list(&self, request: &PageRequest) -> Result<Page<AuthorResponse>, ServiceError> {
        let page = self
            .authors
            .find_page(Visibility::ActiveOnly, request)
            .await?;
        Ok(page.map(|author| AuthorResponse::from(&author)))
    }

    /// Overwrite the editable fields. The name pair is not checked again.
    pub async fn update(&self, id: i64, data: AuthorData) -> Result<AuthorResponse, ServiceError> {
        let mut author = self.find(id).await?;
        author.update_fields(data, entities::now());
        self.authors.update(&author).await?;

        tracing::info!(author_id = id, "author updated");
        Ok(AuthorResponse::from(&author))
    }

    /// Soft delete; repeating it is harmless
    pub async fn deactivate(&self, id: i64) -> Result<(), ServiceError> {
        let mut author = self.find(id).await?;
        if !author.is_active() {
            tracing::debug!(author_id = id, "author already inactive");
            return Ok(());
        }

        author.deactivate(entities::now());
        self.authors.update(&author).await?;
        tracing::info!(author_id = id, "author deactivated");
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Author, ServiceError> {
        self.authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(RESOURCE, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn service() -> (AuthorService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AuthorService::new(store.clone()), store)
    }

    fn data(nombre: &str, apellido: &str) -> AuthorData {
        AuthorData {
            nombre: nombre.to_string(),
            apellido: apellido.to_string(),
            nacionalidad: None,
            fecha_nacimiento: None,
        }
    }

    async fn row_count(store: &MemoryStore) -> u64 {
        AuthorStore::find_page(store, Visibility::IncludeInactive, &PageRequest::new(0, 100))
            .await
            .unwrap()
            .total_elements
    }

    #[tokio::test]
    async fn create_then_fetch_round_trip() {
        let (service, _) = service();

        let created = service.create(data("Ada", "Lovelace")).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap();

        assert_eq!(created, fetched);
        assert!(fetched.activo);
    }

    #[tokio::test]
    async fn duplicate_name_pair_is_rejected_without_insert() {
        let (service, store) = service();
        service.create(data("Ada", "Lovelace")).await.unwrap();

        let err = service.create(data("Ada", "Lovelace")).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Ya existe un Autor con el valor 'Ada Lovelace'"
        );
        assert_eq!(row_count(&store).await, 1);
    }

    #[tokio::test]
    async fn deactivated_authors_still_reserve_their_name() {
        let (service, store) = service();
        let ada = service.create(data("Ada", "Lovelace")).await.unwrap();
        service.deactivate(ada.id).await.unwrap();

        let err = service.create(data("Ada", "Lovelace")).await.unwrap_err();

        assert!(matches!(err, ServiceError::DuplicateResource { .. }));
        assert_eq!(row_count(&store).await, 1);
    }

    #[tokio::test]
    async fn same_given_name_different_family_name_is_fine() {
        let (service, _) = service();
        service.create(data("Ada", "Lovelace")).await.unwrap();

        assert!(service.create(data("Ada", "Byron")).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (service, _) = service();

        let err = service.get_by_id(99).await.unwrap_err();
        assert_eq!(err.to_string(), "No se encontró Autor con ID 99");
        assert!(service.update(99, data("A", "B")).await.is_err());
        assert!(matches!(
            service.deactivate(99).await,
            Err(ServiceError::NotFound { id: 99, .. })
        ));
    }

    #[tokio::test]
    async fn deactivate_is_idempotent_and_keeps_row_fetchable() {
        let (service, _) = service();
        let ada = service.create(data("Ada", "Lovelace")).await.unwrap();

        service.deactivate(ada.id).await.unwrap();
        service.deactivate(ada.id).await.unwrap();

        let fetched = service.get_by_id(ada.id).await.unwrap();
        assert!(!fetched.activo);

        let page = service.list(&PageRequest::new(0, 20)).await.unwrap();
        assert!(page.content.iter().all(|author| author.id != ada.id));
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_keeps_creation_time() {
        let (service, _) = service();
        let ada = service.create(data("Ada", "Lovelace")).await.unwrap();

        let updated = service
            .update(
                ada.id,
                AuthorData {
                    nacionalidad: Some("Británica".to_string()),
                    ..data("Augusta Ada", "King")
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, ada.id);
        assert_eq!(updated.nombre, "Augusta Ada");
        assert_eq!(updated.nacionalidad.as_deref(), Some("Británica"));
        assert_eq!(updated.created_at, ada.created_at);
        assert!(updated.updated_at >= ada.updated_at);
        assert_eq!(updated.updated_at.timestamp_subsec_nanos() % 1_000, 0);

        let fetched = service.get_by_id(ada.id).await.unwrap();
        assert_eq!(fetched.updated_at, updated.updated_at);
    }

    #[tokio::test]
    async fn update_to_a_taken_name_pair_is_allowed() {
        let (service, _) = service();
        service.create(data("Ada", "Lovelace")).await.unwrap();
        let alan = service.create(data("Alan", "Turing")).await.unwrap();

        let updated = service.update(alan.id, data("Ada", "Lovelace")).await.unwrap();

        assert_eq!(updated.nombre, "Ada");
    }

    #[tokio::test]
    async fn list_pages_active_authors_by_id() {
        let (service, _) = service();
        for (nombre, apellido) in [("Ada", "Lovelace"), ("Alan", "Turing"), ("Grace", "Hopper")] {
            service.create(data(nombre, apellido)).await.unwrap();
        }
        service.deactivate(1).await.unwrap();

        let page = service.list(&PageRequest::new(0, 1)).await.unwrap();

        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].nombre, "Alan");
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_pages(), 2);
    }
}
