use async_trait::async_trait;
use serde_json::Value;

use crate::{
    application::repos::{CreateProfileParams, RepoError, UsersRepo, UsersWriteRepo},
    domain::{
        entities::UserProfileRecord, membership::MembershipSet, types::MembershipKind,
        types::UserRole,
    },
    infra::store::Fields,
};

use super::{DocumentRepositories, USERS, codec};

fn decode_user(id: String, fields: &Fields) -> UserProfileRecord {
    UserProfileRecord {
        id,
        email: codec::opt_string(fields, "email"),
        display_name: codec::opt_string(fields, "displayName"),
        role: UserRole::from_field(fields.get("role").and_then(Value::as_str)),
        liked_posts: MembershipSet::from(codec::string_list(fields, MembershipKind::Liked.field())),
        favorite_posts: MembershipSet::from(codec::string_list(
            fields,
            MembershipKind::Favorites.field(),
        )),
    }
}

#[async_trait]
impl UsersRepo for DocumentRepositories {
    async fn list_users(&self) -> Result<Vec<UserProfileRecord>, RepoError> {
        let documents = self.store().list(USERS).await?;
        Ok(documents
            .into_iter()
            .map(|(id, fields)| decode_user(id, &fields))
            .collect())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserProfileRecord>, RepoError> {
        let fields = self.store().get(USERS, id).await?;
        Ok(fields.map(|fields| decode_user(id.to_string(), &fields)))
    }
}

#[async_trait]
impl UsersWriteRepo for DocumentRepositories {
    async fn create_profile(
        &self,
        params: CreateProfileParams,
    ) -> Result<UserProfileRecord, RepoError> {
        let mut fields = Fields::new();
        fields.insert("email".into(), Value::String(params.email));
        fields.insert("displayName".into(), codec::opt_value(params.display_name));
        self.store().merge(USERS, &params.id, fields).await?;

        let stored = self
            .store()
            .get(USERS, &params.id)
            .await?
            .ok_or(RepoError::NotFound)?;
        Ok(decode_user(params.id, &stored))
    }

    async fn set_role(&self, user_id: &str, role: UserRole) -> Result<(), RepoError> {
        let mut fields = Fields::new();
        fields.insert("role".into(), Value::String(role.as_str().to_string()));
        self.store().merge(USERS, user_id, fields).await?;
        Ok(())
    }

    async fn store_membership(
        &self,
        user_id: &str,
        kind: MembershipKind,
        set: &MembershipSet,
    ) -> Result<(), RepoError> {
        let encoded = serde_json::to_value(set)
            .map_err(|err| RepoError::decode(format!("membership set: {err}")))?;
        let mut fields = Fields::new();
        fields.insert(kind.field().into(), encoded);
        self.store().merge(USERS, user_id, fields).await?;
        Ok(())
    }
}
