//! In-process store used by the handler and router tests.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::places::{
    repo::PlaceRepo,
    repo_types::{NewPlace, Place},
};
use crate::profiles::{
    repo::ProfileRepo,
    repo_types::{Profile, ProfileFields},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // sequence number breaks ties between equal timestamps
    places: HashMap<Uuid, (u64, Place)>,
    profiles: HashMap<Uuid, Profile>,
    seq: u64,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count_users(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

fn sorted_newest_first(mut places: Vec<(u64, Place)>) -> Vec<Place> {
    places.sort_by(|(sa, a), (sb, b)| b.updated_at.cmp(&a.updated_at).then(sb.cmp(sa)));
    places.into_iter().map(|(_, p)| p).collect()
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == new.email) {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            profile_id: None,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn link_profile(&self, user_id: Uuid, profile_id: Uuid) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if let Some(u) = t.users.get_mut(&user_id) {
            u.profile_id = Some(profile_id);
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }
}

#[async_trait]
impl PlaceRepo for MemoryStore {
    async fn list_places(&self) -> anyhow::Result<Vec<Place>> {
        let t = self.tables.read().await;
        Ok(sorted_newest_first(t.places.values().cloned().collect()))
    }

    async fn list_places_by_creator(&self, creator: Uuid) -> anyhow::Result<Vec<Place>> {
        let t = self.tables.read().await;
        let mine = t
            .places
            .values()
            .filter(|(_, p)| p.creator == creator)
            .cloned()
            .collect();
        Ok(sorted_newest_first(mine))
    }

    async fn find_place(&self, id: Uuid) -> anyhow::Result<Option<Place>> {
        let t = self.tables.read().await;
        Ok(t.places.get(&id).map(|(_, p)| p.clone()))
    }

    async fn create_place(&self, new: NewPlace) -> anyhow::Result<Place> {
        let mut t = self.tables.write().await;
        let now = OffsetDateTime::now_utc();
        let place = Place {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            address: new.address,
            location: new.location,
            image: new.image,
            creator: new.creator,
            created_at: now,
            updated_at: now,
        };
        let seq = t.next_seq();
        t.places.insert(place.id, (seq, place.clone()));
        Ok(place)
    }

    async fn update_place(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Option<Place>> {
        let mut t = self.tables.write().await;
        let seq = t.next_seq();
        let Some(entry) = t.places.get_mut(&id) else {
            return Ok(None);
        };
        entry.0 = seq;
        entry.1.title = title.to_string();
        entry.1.description = description.to_string();
        entry.1.updated_at = OffsetDateTime::now_utc();
        Ok(Some(entry.1.clone()))
    }

    async fn delete_place(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.tables.write().await.places.remove(&id).is_some())
    }

    async fn delete_places_by_creator(&self, creator: Uuid) -> anyhow::Result<u64> {
        let mut t = self.tables.write().await;
        let before = t.places.len();
        t.places.retain(|_, (_, p)| p.creator != creator);
        Ok((before - t.places.len()) as u64)
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn find_profile_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&owner_id).cloned())
    }

    async fn upsert_profile(&self, f: ProfileFields) -> anyhow::Result<(Profile, bool)> {
        let mut t = self.tables.write().await;
        let now = OffsetDateTime::now_utc();
        if let Some(p) = t.profiles.get_mut(&f.owner_id) {
            p.first_name = f.first_name;
            p.last_name = f.last_name;
            p.birth_year = f.birth_year;
            p.country = f.country;
            p.address = f.address;
            p.image = f.image;
            p.updated_at = now;
            return Ok((p.clone(), false));
        }
        let profile = Profile {
            id: Uuid::new_v4(),
            owner_id: f.owner_id,
            first_name: f.first_name,
            last_name: f.last_name,
            birth_year: f.birth_year,
            country: f.country,
            address: f.address,
            image: f.image,
            created_at: now,
            updated_at: now,
        };
        t.profiles.insert(f.owner_id, profile.clone());
        Ok((profile, true))
    }

    async fn delete_profiles_by_owner(&self, owner_id: Uuid) -> anyhow::Result<u64> {
        let removed = self.tables.write().await.profiles.remove(&owner_id);
        Ok(removed.map_or(0, |_| 1))
    }
}

/// A `MemoryStore` whose bulk place delete always fails, for exercising a
/// user cascade that stops part way.
#[derive(Default)]
pub struct FailingPlaceCascade {
    pub inner: MemoryStore,
}

#[async_trait]
impl UserRepo for FailingPlaceCascade {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        self.inner.create_user(new).await
    }

    async fn link_profile(&self, user_id: Uuid, profile_id: Uuid) -> anyhow::Result<()> {
        self.inner.link_profile(user_id, profile_id).await
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        self.inner.delete_user(id).await
    }
}

#[async_trait]
impl PlaceRepo for FailingPlaceCascade {
    async fn list_places(&self) -> anyhow::Result<Vec<Place>> {
        self.inner.list_places().await
    }

    async fn list_places_by_creator(&self, creator: Uuid) -> anyhow::Result<Vec<Place>> {
        self.inner.list_places_by_creator(creator).await
    }

    async fn find_place(&self, id: Uuid) -> anyhow::Result<Option<Place>> {
        self.inner.find_place(id).await
    }

    async fn create_place(&self, new: NewPlace) -> anyhow::Result<Place> {
        self.inner.create_place(new).await
    }

    async fn update_place(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Option<Place>> {
        self.inner.update_place(id, title, description).await
    }

    async fn delete_place(&self, id: Uuid) -> anyhow::Result<bool> {
        self.inner.delete_place(id).await
    }

    async fn delete_places_by_creator(&self, _creator: Uuid) -> anyhow::Result<u64> {
        anyhow::bail!("connection reset by pg-replica-7 while deleting places")
    }
}

#[async_trait]
impl ProfileRepo for FailingPlaceCascade {
    async fn find_profile_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Profile>> {
        self.inner.find_profile_by_owner(owner_id).await
    }

    async fn upsert_profile(&self, f: ProfileFields) -> anyhow::Result<(Profile, bool)> {
        self.inner.upsert_profile(f).await
    }

    async fn delete_profiles_by_owner(&self, owner_id: Uuid) -> anyhow::Result<u64> {
        self.inner.delete_profiles_by_owner(owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::Coordinates;

    fn new_place(creator: Uuid, title: &str) -> NewPlace {
        NewPlace {
            title: title.into(),
            description: "d".into(),
            address: "a".into(),
            location: Coordinates { lat: 1.0, lng: 2.0 },
            image: "https://images.test/x.png".into(),
            creator,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let store = MemoryStore::new();
        let new = NewUser {
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: "h".into(),
        };
        assert!(store.create_user(new.clone()).await.unwrap().is_some());
        assert!(store.create_user(new).await.unwrap().is_none());
        assert_eq!(store.count_users().await, 1);
    }

    #[tokio::test]
    async fn updated_place_moves_to_the_front() {
        let store = MemoryStore::new();
        let creator = Uuid::new_v4();
        let first = store.create_place(new_place(creator, "first")).await.unwrap();
        store.create_place(new_place(creator, "second")).await.unwrap();

        let titles: Vec<_> = store.list_places().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, ["second", "first"]);

        store.update_place(first.id, "first again", "d").await.unwrap();
        let titles: Vec<_> = store.list_places().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, ["first again", "second"]);
    }

    #[tokio::test]
    async fn upsert_reports_create_then_update() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let fields = ProfileFields {
            owner_id: owner,
            first_name: "Ada".into(),
            last_name: "L".into(),
            birth_year: 1990,
            country: "UK".into(),
            address: "London".into(),
            image: "https://images.test/1.png".into(),
        };
        let (p1, created) = store.upsert_profile(fields.clone()).await.unwrap();
        assert!(created);
        let (p2, created) = store
            .upsert_profile(ProfileFields { country: "FR".into(), ..fields })
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(p1.id, p2.id);
        assert_eq!(p2.country, "FR");
    }
}
