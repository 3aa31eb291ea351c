use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::{StreamExt, stream};
use shelf_config::Config;
use shelf_extract::Extractor;
use shelf_library::{BookCreator, Collection, Outcome};
use shelf_render::{PdfRasterizer, Thumbnailer};
use shelf_sqlite::{Database, SqliteBlobStore, SqliteItemStore};
use shelf_storage::{Item, Tag};
use std::path::PathBuf;
use std::sync::Arc;

/// Documents read and thumbnailed at the same time by `add`.
const CREATE_CONCURRENCY: usize = 4;

pub struct App {
    db: Database,
    collection: Collection,
    creator: BookCreator,
}

impl App {
    pub async fn open(config: &Config) -> Result<Self> {
        let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
        let extractor = Extractor::new(PdfRasterizer::new(config.pdf.scale, config.pdf.library.clone()));
        let creator = BookCreator::new(extractor, Thumbnailer::new(config.thumbnail.size));
        Ok(Self::new(db, creator))
    }

    fn new(db: Database, creator: BookCreator) -> Self {
        let collection = Collection::new(Arc::new(SqliteItemStore::from(&db)), Arc::new(SqliteBlobStore::from(&db)));
        Self { db, collection, creator }
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    pub async fn add(&self, paths: &[PathBuf]) -> Result<()> {
        let mut created = stream::iter(paths)
            .map(|path| async move { (path, self.creator.create_from_file(path).await) })
            .buffer_unordered(CREATE_CONCURRENCY);

        let mut failures = 0;
        while let Some((path, result)) = created.next().await {
            let outcome = match result {
                Ok(item) => self.collection.add_item(item).await,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = ?err, "could not read document");
                    Outcome::Error((*err).to_string())
                },
            };
            failures += usize::from(outcome.is_error());
            println!("{}  {}", describe_outcome(&outcome), path.display());
        }
        settled(failures)
    }

    pub async fn list(&self, all: bool) -> Result<()> {
        let items = self.collection.get_items().await.or_raise(|| ErrorKind::Collection)?;
        for item in items.iter().filter(|item| all || !item.deleted) {
            println!("{}", describe(item));
        }
        Ok(())
    }

    pub async fn find(&self, prefix: &str) -> Result<()> {
        for item in self.collection.find(prefix).await.or_raise(|| ErrorKind::Collection)? {
            println!("{}", describe(&item));
            for meta in &item.metadata {
                println!("    {}: {:?}", meta.name, meta.value);
            }
        }
        Ok(())
    }

    pub async fn set_deleted(&self, prefix: &str, deleted: bool) -> Result<()> {
        let id = self.resolve(prefix).await?;
        self.report([self.collection.set_deleted(&id, deleted).await])
    }

    pub async fn delete_all(&self) -> Result<()> {
        let items = self.collection.get_items().await.or_raise(|| ErrorKind::Collection)?;
        let outcomes = stream::iter(items.iter().filter(|item| !item.deleted))
            .then(|item| self.collection.set_deleted(&item.id, true))
            .collect::<Vec<_>>()
            .await;
        self.report(outcomes)
    }

    pub async fn set_read(&self, prefix: &str, read: bool) -> Result<()> {
        let id = self.resolve(prefix).await?;
        self.report([self.collection.set_read(&id, read).await])
    }

    pub async fn tag(&self, prefix: &str, tags: &[String], add: bool) -> Result<()> {
        let tags = tags
            .iter()
            .map(|tag| Tag::try_from(tag.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .or_raise(|| ErrorKind::Tag)?;
        let id = self.resolve(prefix).await?;
        let id = id.as_str();
        let outcomes = stream::iter(tags)
            .then(move |tag| async move {
                if add {
                    self.collection.add_tag(id, tag).await
                } else {
                    self.collection.remove_tag(id, &tag).await
                }
            })
            .collect::<Vec<_>>()
            .await;
        self.report(outcomes)
    }

    pub async fn purge(&self, prefix: &str) -> Result<()> {
        let id = self.resolve(prefix).await?;
        self.report([self.collection.delete_item(&id).await])
    }

    /// Expand an id prefix to the single id it matches.
    async fn resolve(&self, prefix: &str) -> Result<String> {
        let mut matches = self.collection.find(prefix).await.or_raise(|| ErrorKind::Collection)?;
        match matches.len() {
            0 => exn::bail!(ErrorKind::NoMatch(prefix.to_string())),
            1 => Ok(matches.remove(0).id),
            count => exn::bail!(ErrorKind::Ambiguous { prefix: prefix.to_string(), count }),
        }
    }

    fn report(&self, outcomes: impl IntoIterator<Item = Outcome>) -> Result<()> {
        let mut failures = 0;
        for outcome in outcomes {
            failures += usize::from(outcome.is_error());
            match outcome.item() {
                Some(item) => println!("{}  {}", describe_outcome(&outcome), describe(item)),
                None => println!("{}", describe_outcome(&outcome)),
            }
        }
        settled(failures)
    }
}

fn settled(failures: usize) -> Result<()> {
    if failures > 0 {
        exn::bail!(ErrorKind::Failures(failures));
    }
    Ok(())
}

fn describe_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Added(_) => "added".to_string(),
        Outcome::Updated(_) => "updated".to_string(),
        Outcome::NotFound(_) => "not found".to_string(),
        Outcome::AlreadyExists(_) => "already exists".to_string(),
        Outcome::Deleted(_) => "purged".to_string(),
        Outcome::Error(message) => format!("error: {message}"),
    }
}

/// One-line summary: id, file name, flags and tags.
fn describe(item: &Item) -> String {
    let mut line = item.id.clone();
    line.push_str("  ");
    line.push_str(&item.name);
    if !item.extension.is_empty() {
        line.push('.');
        line.push_str(&item.extension);
    }
    if item.read {
        line.push_str("  [read]");
    }
    if item.deleted {
        line.push_str("  [deleted]");
    }
    if !item.tags.is_empty() {
        let tags: Vec<&str> = item.tags.iter().map(Tag::as_str).collect();
        line.push_str("  #");
        line.push_str(&tags.join(" #"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::UtcDateTime;

    async fn app() -> App {
        App::new(Database::connect_in_memory().await.unwrap(), BookCreator::default())
    }

    fn item(id: &str) -> Item {
        Item::new(id, "Middlemarch", "/books/Middlemarch.epub", "epub", UtcDateTime::UNIX_EPOCH)
    }

    #[rstest]
    #[case::plain(item("ab12"), "ab12  Middlemarch.epub")]
    #[case::flags(item("ab12").with_read(true).with_deleted(true), "ab12  Middlemarch.epub  [read]  [deleted]")]
    #[case::tags(
        item("ab12").with_tag(Tag::try_from("victorian").unwrap()).with_tag(Tag::try_from("classic").unwrap()),
        "ab12  Middlemarch.epub  #classic #victorian"
    )]
    fn test_describe(#[case] item: Item, #[case] expected: &str) {
        assert_eq!(describe(&item), expected);
    }

    #[test]
    fn test_no_extension() {
        let item = Item::new("ab12", "README", "README", "", UtcDateTime::UNIX_EPOCH);
        assert_eq!(describe(&item), "ab12  README");
    }

    #[tokio::test]
    async fn test_resolve_prefix() {
        let app = app().await;
        for id in ["ab12", "ab34", "cd56"] {
            assert!(matches!(app.collection.add_item(item(id)).await, Outcome::Added(_)));
        }

        assert_eq!(app.resolve("cd").await.unwrap(), "cd56");
        assert_eq!(app.resolve("ab34").await.unwrap(), "ab34");
        let err = app.resolve("ab").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Ambiguous { count: 2, .. }));
        let err = app.resolve("ff").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoMatch(prefix) if prefix == "ff"));
    }

    #[tokio::test]
    async fn test_add_delete_all_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("one.txt");
        let second = dir.path().join("two.txt");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&second, b"second").unwrap();

        let app = app().await;
        app.add(&[first.clone(), second]).await.unwrap();
        assert_eq!(app.collection.get_items().await.unwrap().len(), 2);

        app.delete_all().await.unwrap();
        assert!(app.collection.get_items().await.unwrap().iter().all(|item| item.deleted));

        // Re-adding restores instead of duplicating.
        app.add(&[first]).await.unwrap();
        let items = app.collection.get_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().filter(|item| !item.deleted).count(), 1);
    }

    #[tokio::test]
    async fn test_add_missing_file_fails() {
        let app = app().await;
        let err = app.add(&[PathBuf::from("/definitely/not/here.epub")]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Failures(1)));
    }

    #[tokio::test]
    async fn test_tag_and_untag() {
        let app = app().await;
        app.collection.add_item(item("ab12")).await;

        app.tag("ab", &["fiction".to_string(), "classic".to_string()], true).await.unwrap();
        let stored = app.collection.find("ab12").await.unwrap().remove(0);
        assert_eq!(stored.tags.len(), 2);

        app.tag("ab", &["fiction".to_string()], false).await.unwrap();
        let stored = app.collection.find("ab12").await.unwrap().remove(0);
        assert_eq!(stored.tags.iter().map(Tag::as_str).collect::<Vec<_>>(), ["classic"]);

        let err = app.tag("ab", &["   ".to_string()], true).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Tag));
    }

    #[tokio::test]
    async fn test_purge() {
        let app = app().await;
        app.collection.add_item(item("ab12")).await;
        app.purge("ab1").await.unwrap();
        assert!(app.collection.get_items().await.unwrap().is_empty());
    }
}
