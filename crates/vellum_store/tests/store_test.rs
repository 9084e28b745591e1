//! Content store behaviour on both backends.

use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;
use vellum_core::ContentMetadata;
use vellum_error::{VellumErrorKind, VellumResult};
use vellum_storage::{
    BackendKind, DocumentBucket, DocumentStoreResolver, FileSystemResolver, MemoryBucket,
    ResourceResolver,
};
use vellum_store::ContentStore;

/// Entity with dedicated content fields.
#[derive(Debug, Default, Clone)]
struct Attachment {
    content_id: Option<String>,
    content_length: u64,
}

impl ContentMetadata for Attachment {
    type Id = String;

    fn content_id(&self) -> VellumResult<Option<String>> {
        Ok(self.content_id.clone())
    }

    fn set_content_id(&mut self, id: Option<String>) -> VellumResult<()> {
        self.content_id = id;
        Ok(())
    }

    fn content_length(&self) -> VellumResult<u64> {
        Ok(self.content_length)
    }

    fn set_content_length(&mut self, length: u64) -> VellumResult<()> {
        self.content_length = length;
        Ok(())
    }
}

/// Entity whose primary key doubles as the content identifier.
#[derive(Debug, Clone)]
struct Scan {
    id: Option<String>,
    size: u64,
}

impl ContentMetadata for Scan {
    type Id = String;

    fn content_id(&self) -> VellumResult<Option<String>> {
        Ok(self.id.clone())
    }

    fn set_content_id(&mut self, id: Option<String>) -> VellumResult<()> {
        self.id = id;
        Ok(())
    }

    fn content_length(&self) -> VellumResult<u64> {
        Ok(self.size)
    }

    fn set_content_length(&mut self, length: u64) -> VellumResult<()> {
        self.size = length;
        Ok(())
    }

    fn content_id_is_primary_key(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
struct Photo {
    content_id: Option<Uuid>,
    content_length: u64,
}

impl ContentMetadata for Photo {
    type Id = Uuid;

    fn content_id(&self) -> VellumResult<Option<Uuid>> {
        Ok(self.content_id)
    }

    fn set_content_id(&mut self, id: Option<Uuid>) -> VellumResult<()> {
        self.content_id = id;
        Ok(())
    }

    fn content_length(&self) -> VellumResult<u64> {
        Ok(self.content_length)
    }

    fn set_content_length(&mut self, length: u64) -> VellumResult<()> {
        self.content_length = length;
        Ok(())
    }
}

/// Entity with a numeric identifier no UUID can be coerced into.
#[derive(Debug, Default)]
struct Invoice {
    content_id: Option<i64>,
    content_length: u64,
}

impl ContentMetadata for Invoice {
    type Id = i64;

    fn content_id(&self) -> VellumResult<Option<i64>> {
        Ok(self.content_id)
    }

    fn set_content_id(&mut self, id: Option<i64>) -> VellumResult<()> {
        self.content_id = id;
        Ok(())
    }

    fn content_length(&self) -> VellumResult<u64> {
        Ok(self.content_length)
    }

    fn set_content_length(&mut self, length: u64) -> VellumResult<()> {
        self.content_length = length;
        Ok(())
    }
}

struct Backend {
    resolver: Arc<dyn ResourceResolver>,
    bucket: Option<Arc<MemoryBucket>>,
    dir: Option<TempDir>,
}

fn filesystem() -> Backend {
    let dir = TempDir::new().unwrap();
    let resolver = FileSystemResolver::new(dir.path()).unwrap();
    Backend {
        resolver: Arc::new(resolver),
        bucket: None,
        dir: Some(dir),
    }
}

fn document() -> Backend {
    let bucket = Arc::new(MemoryBucket::with_chunk_size("attachments", 4));
    Backend {
        resolver: Arc::new(DocumentStoreResolver::new(bucket.clone())),
        bucket: Some(bucket),
        dir: None,
    }
}

fn backends() -> Vec<Backend> {
    vec![filesystem(), document()]
}

async fn read_all<E: ContentMetadata>(store: &ContentStore<E>, entity: &E) -> Option<String> {
    let mut stream = store.content(entity).await.unwrap()?;
    let mut content = String::new();
    stream.read_to_string(&mut content).await.unwrap();
    Some(content)
}

#[tokio::test]
async fn test_set_content_generates_id_and_length() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment::default();

        let length = store.set_content(&mut attachment, &b"hello"[..]).await.unwrap();

        assert_eq!(length, 5);
        assert_eq!(attachment.content_length, 5);
        let id = attachment.content_id.clone().unwrap();
        assert!(!id.is_empty());
        assert!(backend.resolver.resolve(&id).await.unwrap().exists().await.unwrap());
        assert_eq!(read_all(&store, &attachment).await.as_deref(), Some("hello"));
    }
}

#[tokio::test]
async fn test_set_content_replaces_previous_content() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment::default();

        store
            .set_content(&mut attachment, &b"first version"[..])
            .await
            .unwrap();
        let id = attachment.content_id.clone().unwrap();

        store.set_content(&mut attachment, &b"second"[..]).await.unwrap();

        assert_eq!(attachment.content_id.as_deref(), Some(id.as_str()));
        assert_eq!(attachment.content_length, 6);
        assert_eq!(read_all(&store, &attachment).await.as_deref(), Some("second"));

        if let Some(bucket) = &backend.bucket {
            assert_eq!(bucket.find_all(&id).await.unwrap().len(), 1);
        }
    }
}

#[tokio::test]
async fn test_set_content_keeps_existing_id() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment {
            content_id: Some("form-1".to_string()),
            content_length: 0,
        };

        store.set_content(&mut attachment, &b"abc"[..]).await.unwrap();

        assert_eq!(attachment.content_id.as_deref(), Some("form-1"));
        let resource = backend.resolver.resolve("form-1").await.unwrap();
        assert_eq!(resource.content_length().await.unwrap(), 3);
    }
}

#[tokio::test]
async fn test_set_content_with_small_chunks() {
    for backend in backends() {
        let store: ContentStore<Attachment> = ContentStore::builder()
            .resolver(backend.resolver.clone())
            .copy_chunk_size(3)
            .build()
            .unwrap();
        let mut attachment = Attachment::default();

        let length = store
            .set_content(&mut attachment, &b"0123456789"[..])
            .await
            .unwrap();

        assert_eq!(length, 10);
        assert_eq!(read_all(&store, &attachment).await.as_deref(), Some("0123456789"));
    }
}

#[tokio::test]
async fn test_set_empty_content() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment {
            content_id: None,
            content_length: 9,
        };

        assert_eq!(store.set_content(&mut attachment, &b""[..]).await.unwrap(), 0);
        assert_eq!(attachment.content_length, 0);
        assert_eq!(read_all(&store, &attachment).await.as_deref(), Some(""));
    }
}

#[tokio::test]
async fn test_resource_for_is_stable() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment {
            content_id: None,
            content_length: 7,
        };

        let first = store.resource_for(&mut attachment).await.unwrap();
        let second = store.resource_for(&mut attachment).await.unwrap();

        assert_eq!(first.key(), second.key());
        assert_eq!(attachment.content_id.as_deref(), Some(first.key()));
        assert_eq!(attachment.content_length, 7);
        assert!(!first.exists().await.unwrap());
    }
}

#[tokio::test]
async fn test_resource_for_id_does_not_create() {
    for backend in backends() {
        let store: ContentStore<Attachment> = ContentStore::new(backend.resolver.clone());

        let resource = store.resource_for_id(&"missing".to_string()).await.unwrap();

        assert_eq!(resource.key(), "missing");
        assert!(!resource.exists().await.unwrap());
        assert!(!backend.resolver.resolve("missing").await.unwrap().exists().await.unwrap());
    }
}

#[tokio::test]
async fn test_associate_existing_content() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let resource = backend.resolver.resolve("12345").await.unwrap();
        let mut sink = resource.open_write().await.unwrap();
        sink.write_all(&[7u8; 20]).await.unwrap();
        sink.finish().await.unwrap();

        let mut attachment = Attachment::default();
        store
            .associate(&mut attachment, "12345".to_string())
            .await
            .unwrap();

        assert_eq!(attachment.content_id.as_deref(), Some("12345"));
        assert_eq!(attachment.content_length, 20);
    }
}

#[tokio::test]
async fn test_associated_entity_resolves_like_its_id() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment::default();

        store
            .associate(&mut attachment, "claims/2024/form-1".to_string())
            .await
            .unwrap();

        let by_entity = store.resource_for(&mut attachment).await.unwrap();
        let by_id = store
            .resource_for_id(&"claims/2024/form-1".to_string())
            .await
            .unwrap();
        assert_eq!(by_entity.key(), by_id.key());
        assert_eq!(by_entity.description(), by_id.description());
    }
}

#[tokio::test]
async fn test_nested_key_creates_parents() {
    let backend = filesystem();
    let store = ContentStore::new(backend.resolver.clone());
    let mut attachment = Attachment {
        content_id: Some("claims/2024/form-1".to_string()),
        content_length: 0,
    };

    store.set_content(&mut attachment, &b"nested"[..]).await.unwrap();

    let root = backend.dir.as_ref().unwrap().path();
    assert_eq!(
        std::fs::read(root.join("claims/2024/form-1")).unwrap(),
        b"nested"
    );
}

#[tokio::test]
async fn test_associate_absent_content_keeps_length() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment {
            content_id: Some("old".to_string()),
            content_length: 3,
        };

        store
            .associate(&mut attachment, "nothing-here".to_string())
            .await
            .unwrap();

        assert_eq!(attachment.content_id.as_deref(), Some("nothing-here"));
        assert_eq!(attachment.content_length, 3);
    }
}

#[tokio::test]
async fn test_unassociate_leaves_content() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment::default();
        store.set_content(&mut attachment, &b"kept"[..]).await.unwrap();
        let id = attachment.content_id.clone().unwrap();

        store.unassociate(&mut attachment).unwrap();

        assert_eq!(attachment.content_id, None);
        assert_eq!(attachment.content_length, 0);
        assert!(backend.resolver.resolve(&id).await.unwrap().exists().await.unwrap());
        assert!(store.content(&attachment).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_unassociate_keeps_primary_key() {
    let backend = document();
    let store = ContentStore::new(backend.resolver.clone());
    let mut scan = Scan {
        id: Some("scan-9".to_string()),
        size: 12,
    };

    store.unassociate(&mut scan).unwrap();

    assert_eq!(scan.id.as_deref(), Some("scan-9"));
    assert_eq!(scan.size, 0);
}

#[tokio::test]
async fn test_content_absent() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let attachment = Attachment {
            content_id: Some("never-written".to_string()),
            content_length: 0,
        };

        assert!(store.content(&attachment).await.unwrap().is_none());
        assert!(
            !backend
                .resolver
                .resolve("never-written")
                .await
                .unwrap()
                .exists()
                .await
                .unwrap()
        );
    }
}

#[tokio::test]
async fn test_unset_content_is_idempotent() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment::default();
        store.set_content(&mut attachment, &b"hello"[..]).await.unwrap();
        let id = attachment.content_id.clone().unwrap();

        store.unset_content(&mut attachment).await.unwrap();

        assert_eq!(attachment.content_id, None);
        assert_eq!(attachment.content_length, 0);
        assert!(!backend.resolver.resolve(&id).await.unwrap().exists().await.unwrap());

        store.unset_content(&mut attachment).await.unwrap();
        assert_eq!(attachment.content_id, None);
        assert_eq!(attachment.content_length, 0);
    }
}

#[tokio::test]
async fn test_unset_content_without_backing_content() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut attachment = Attachment {
            content_id: Some("gone".to_string()),
            content_length: 4,
        };

        store.unset_content(&mut attachment).await.unwrap();

        assert_eq!(attachment.content_id, None);
        assert_eq!(attachment.content_length, 0);
    }
}

#[tokio::test]
async fn test_unset_content_keeps_primary_key() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut scan = Scan {
            id: Some("scan-1".to_string()),
            size: 0,
        };
        store.set_content(&mut scan, &b"pixels"[..]).await.unwrap();
        assert_eq!(scan.size, 6);

        store.unset_content(&mut scan).await.unwrap();

        assert_eq!(scan.id.as_deref(), Some("scan-1"));
        assert_eq!(scan.size, 0);
        assert!(store.content(&scan).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_uuid_identifiers() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut photo = Photo::default();

        store.set_content(&mut photo, &b"jpeg"[..]).await.unwrap();

        let id = photo.content_id.unwrap();
        let resource = store.resource_for_id(&id).await.unwrap();
        assert_eq!(resource.key(), id.to_string());
        assert_eq!(resource.content_length().await.unwrap(), 4);
    }
}

#[tokio::test]
async fn test_uncoercible_identifier_type() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut invoice = Invoice::default();

        let err = store
            .set_content(&mut invoice, &b"pdf"[..])
            .await
            .unwrap_err();

        assert!(matches!(err.kind(), VellumErrorKind::Resolution(_)));
        assert_eq!(invoice.content_id, None);
        assert_eq!(invoice.content_length, 0);
    }
}

#[tokio::test]
async fn test_numeric_identifier_assigned_by_caller() {
    for backend in backends() {
        let store = ContentStore::new(backend.resolver.clone());
        let mut invoice = Invoice {
            content_id: Some(1042),
            content_length: 0,
        };

        store.set_content(&mut invoice, &b"pdf"[..]).await.unwrap();

        let resource = backend.resolver.resolve("1042").await.unwrap();
        assert_eq!(resource.content_length().await.unwrap(), 3);
        assert_eq!(invoice.content_length, 3);
    }
}

#[tokio::test]
async fn test_backends_are_interchangeable() {
    let kinds: Vec<BackendKind> = backends()
        .iter()
        .map(|backend| backend.resolver.backend())
        .collect();
    assert_eq!(kinds, vec![BackendKind::Filesystem, BackendKind::Document]);
}
