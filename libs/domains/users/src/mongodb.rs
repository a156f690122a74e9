//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, to_bson},
    options::{FindOneAndDeleteOptions, FindOneOptions, IndexOptions},
};
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, Selector, User, UserPatch};
use crate::repository::UserRepository;

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository
    ///
    /// # Arguments
    /// * `db` - MongoDB database instance
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let db = client.database("user-directory");
    /// let repo = MongoUserRepository::new(db);
    /// ```
    pub fn new(db: Database) -> Self {
        let collection = db.collection::<User>("users");
        Self { collection }
    }

    /// Create a new MongoUserRepository with a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<User>(collection_name);
        Self { collection }
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    /// Create the unique index on `email`.
    ///
    /// The service-level duplicate check is advisory: two concurrent creates
    /// can both pass it before either inserts. This index is what actually
    /// upholds the email invariant.
    pub async fn create_indexes(&self) -> UserResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    /// Build a MongoDB filter document from a Selector
    fn selector_filter(selector: &Selector) -> Document {
        match selector {
            Selector::ById(id) => doc! { "_id": to_bson(id).unwrap_or(Bson::Null) },
            Selector::ByEmail(email) => doc! { "email": email },
            Selector::ByName(name) => doc! { "name": name },
        }
    }

    /// Oldest-first ordering makes "first match" deterministic when a name
    /// selector matches several records
    fn first_match_order() -> Document {
        doc! { "created_at": 1 }
    }

    fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
        use mongodb::error::{ErrorKind, WriteFailure};

        match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref write_error)) => {
                write_error.code == 11000
            }
            ErrorKind::Command(ref command_error) => command_error.code == 11000,
            _ => false,
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, input), fields(user_email = %input.email))]
    async fn create(&self, input: CreateUser) -> UserResult<User> {
        let user = User::new(input);

        match self.collection.insert_one(&user).await {
            Ok(_) => {}
            // A concurrent create can slip past the service-level duplicate
            // check; the unique index reports it here
            Err(e) if Self::is_duplicate_key_error(&e) => {
                return Err(UserError::DuplicateEmail(user.email));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> UserResult<Vec<User>> {
        use futures_util::TryStreamExt;

        let cursor = self.collection.find(doc! {}).await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn find_one(&self, selector: &Selector) -> UserResult<Option<User>> {
        let options = FindOneOptions::builder()
            .sort(Self::first_match_order())
            .build();

        let user = self
            .collection
            .find_one(Self::selector_filter(selector))
            .with_options(options)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, selector: &Selector, patch: UserPatch) -> UserResult<User> {
        let existing = self.find_one(selector).await?.ok_or(UserError::NotFound)?;

        let mut updated = existing;
        updated.apply_patch(patch);

        // Replace by _id so a concurrent write cannot redirect the update
        // to a different record matching the same selector
        let id_filter = doc! { "_id": to_bson(&updated.id).unwrap_or(Bson::Null) };
        self.collection.replace_one(id_filter, &updated).await?;

        tracing::info!(user_id = %updated.id, "User updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, selector: &Selector) -> UserResult<User> {
        let options = FindOneAndDeleteOptions::builder()
            .sort(Self::first_match_order())
            .build();

        let deleted = self
            .collection
            .find_one_and_delete(Self::selector_filter(selector))
            .with_options(options)
            .await?
            .ok_or(UserError::NotFound)?;

        tracing::info!(user_id = %deleted.id, "User deleted");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        let count = self
            .collection
            .count_documents(doc! { "email": email })
            .await?;
        Ok(count > 0)
    }
}
