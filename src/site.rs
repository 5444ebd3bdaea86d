use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::content::{
    next_id, About, Contact, Hero, MenuItem, PortfolioCategory, PortfolioItem, ServiceItem,
    SiteData, TestimonialItem, CONTENT_KEY, DEFAULT_SERVICE_ICON,
};
use crate::models::{menu, ContentError};
use crate::store::Store;

/// Fields of a portfolio entry before it has an id.
#[derive(Debug, Clone)]
pub struct NewPortfolioItem {
    pub title: String,
    pub category: String,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub price: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub name: String,
    pub role: String,
    pub text: String,
    pub avatar: String,
}

/// The single shared content document: cached in memory, flushed whole to the
/// key/value store after every edit.
pub struct SiteStore {
    store: Arc<dyn Store>,
    doc: RwLock<SiteData>,
}

impl SiteStore {
    /// Read the stored document, falling back to the built-in defaults.
    /// Defaults are not written until the first edit.
    pub fn load(store: Arc<dyn Store>) -> Self {
        let doc = match store.kv_get(CONTENT_KEY) {
            Some(raw) => match serde_json::from_str::<SiteData>(&raw) {
                Ok(d) => d,
                Err(e) => {
                    log::error!("[content] Stored document is unreadable, using defaults: {}", e);
                    SiteData::default()
                }
            },
            None => SiteData::default(),
        };
        SiteStore {
            store,
            doc: RwLock::new(doc),
        }
    }

    pub fn snapshot(&self) -> SiteData {
        self.read().clone()
    }

    pub fn to_json_pretty(&self) -> Result<String, String> {
        serde_json::to_string_pretty(&*self.read()).map_err(|e| e.to_string())
    }

    fn read(&self) -> RwLockReadGuard<'_, SiteData> {
        self.doc.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SiteData> {
        self.doc.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `edit` on a copy of the document. If it succeeds the copy replaces
    /// the cache and is flushed; if it fails nothing changes.
    fn apply<R>(
        &self,
        edit: impl FnOnce(&mut SiteData) -> Result<R, ContentError>,
    ) -> Result<R, ContentError> {
        let mut guard = self.write();
        let mut next = guard.clone();
        let out = edit(&mut next)?;
        *guard = next;
        self.flush(&guard)?;
        Ok(out)
    }

    fn flush(&self, doc: &SiteData) -> Result<(), ContentError> {
        let raw = serde_json::to_string(doc).map_err(|e| ContentError::Persist(e.to_string()))?;
        self.store.kv_set(CONTENT_KEY, &raw).map_err(|e| {
            log::error!("[content] Failed to save document: {}", e);
            ContentError::Persist(e)
        })
    }

    // ── Whole-section updates ───────────────────────────────────────

    pub fn update_hero(&self, hero: Hero) -> Result<(), ContentError> {
        self.apply(|d| {
            d.hero = hero;
            Ok(())
        })
    }

    pub fn update_about(&self, about: About) -> Result<(), ContentError> {
        self.apply(|d| {
            d.about = about;
            Ok(())
        })
    }

    pub fn update_portfolio(&self, items: Vec<PortfolioItem>) -> Result<(), ContentError> {
        self.apply(|d| {
            d.portfolio = items;
            Ok(())
        })
    }

    pub fn update_services(&self, items: Vec<ServiceItem>) -> Result<(), ContentError> {
        self.apply(|d| {
            d.services = items;
            Ok(())
        })
    }

    pub fn update_testimonials(&self, items: Vec<TestimonialItem>) -> Result<(), ContentError> {
        self.apply(|d| {
            d.testimonials = items;
            Ok(())
        })
    }

    pub fn update_contact(&self, contact: Contact) -> Result<(), ContentError> {
        self.apply(|d| {
            d.contact = contact;
            Ok(())
        })
    }

    pub fn update_site_info(&self, name: &str, description: &str) -> Result<(), ContentError> {
        if name.trim().is_empty() {
            return Err(ContentError::MissingFields);
        }
        self.apply(|d| {
            d.site_name = name.trim().to_string();
            d.site_description = description.trim().to_string();
            Ok(())
        })
    }

    /// Replace the menu. Rejected as a whole on any empty, malformed or duplicate id.
    pub fn update_menu_items(&self, items: Vec<MenuItem>) -> Result<(), ContentError> {
        let items = menu::validate(items)?;
        self.apply(|d| {
            d.menu_items = items;
            Ok(())
        })
    }

    /// Site name, description and menu saved as one edit: either all land or none.
    pub fn update_settings(
        &self,
        name: &str,
        description: &str,
        items: Vec<MenuItem>,
    ) -> Result<(), ContentError> {
        if name.trim().is_empty() {
            return Err(ContentError::MissingFields);
        }
        let items = menu::validate(items)?;
        self.apply(|d| {
            d.site_name = name.trim().to_string();
            d.site_description = description.trim().to_string();
            d.menu_items = items;
            Ok(())
        })
    }

    pub fn add_menu_item(&self, id: &str, text: &str) -> Result<(), ContentError> {
        self.apply(|d| {
            let mut items = d.menu_items.clone();
            items.push(MenuItem {
                id: id.to_string(),
                text: text.to_string(),
            });
            d.menu_items = menu::validate(items)?;
            Ok(())
        })
    }

    pub fn remove_menu_item(&self, id: &str) -> Result<Option<MenuItem>, ContentError> {
        self.apply(|d| {
            let removed = d.menu_items.iter().find(|m| m.id == id).cloned();
            d.menu_items.retain(|m| m.id != id);
            Ok(removed)
        })
    }

    // ── List inserts / removals ─────────────────────────────────────

    pub fn add_portfolio_item(&self, new: NewPortfolioItem) -> Result<PortfolioItem, ContentError> {
        if new.title.trim().is_empty() {
            return Err(ContentError::MissingFields);
        }
        if new.image.trim().is_empty() {
            return Err(ContentError::MissingImage);
        }
        let category = PortfolioCategory::parse(&new.category)
            .ok_or_else(|| ContentError::UnknownCategory(new.category.clone()))?;
        self.apply(|d| {
            let item = PortfolioItem {
                id: next_id(&d.portfolio)?,
                title: new.title.trim().to_string(),
                category: category.slug().to_string(),
                image: new.image.trim().to_string(),
            };
            d.portfolio.push(item.clone());
            Ok(item)
        })
    }

    pub fn remove_portfolio_item(&self, id: i64) -> Result<Option<PortfolioItem>, ContentError> {
        self.apply(|d| Ok(take_by_id(&mut d.portfolio, id, |i| i.id)))
    }

    pub fn add_service(&self, new: NewService) -> Result<ServiceItem, ContentError> {
        if new.title.trim().is_empty() {
            return Err(ContentError::MissingFields);
        }
        let icon = match new.icon.trim() {
            "" => DEFAULT_SERVICE_ICON.to_string(),
            other => other.to_string(),
        };
        self.apply(|d| {
            let item = ServiceItem {
                id: next_id(&d.services)?,
                title: new.title.trim().to_string(),
                description: new.description.trim().to_string(),
                icon,
                price: new
                    .price
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty()),
            };
            d.services.push(item.clone());
            Ok(item)
        })
    }

    pub fn remove_service(&self, id: i64) -> Result<Option<ServiceItem>, ContentError> {
        self.apply(|d| Ok(take_by_id(&mut d.services, id, |i| i.id)))
    }

    pub fn add_testimonial(&self, new: NewTestimonial) -> Result<TestimonialItem, ContentError> {
        if new.name.trim().is_empty() || new.role.trim().is_empty() || new.text.trim().is_empty()
        {
            return Err(ContentError::MissingFields);
        }
        self.apply(|d| {
            let item = TestimonialItem {
                id: next_id(&d.testimonials)?,
                name: new.name.trim().to_string(),
                role: new.role.trim().to_string(),
                text: new.text.trim().to_string(),
                avatar: new.avatar.trim().to_string(),
            };
            d.testimonials.push(item.clone());
            Ok(item)
        })
    }

    pub fn remove_testimonial(&self, id: i64) -> Result<Option<TestimonialItem>, ContentError> {
        self.apply(|d| Ok(take_by_id(&mut d.testimonials, id, |i| i.id)))
    }

    // ── Whole-document operations ───────────────────────────────────

    pub fn reset_to_defaults(&self) -> Result<(), ContentError> {
        self.apply(|d| {
            *d = SiteData::default();
            Ok(())
        })
    }

    /// Replace the entire document (backup restore). The menu must still be valid.
    pub fn replace_all(&self, mut doc: SiteData) -> Result<(), ContentError> {
        doc.menu_items = menu::validate(doc.menu_items)?;
        self.apply(|d| {
            *d = doc;
            Ok(())
        })
    }
}

fn take_by_id<T>(items: &mut Vec<T>, id: i64, key: impl Fn(&T) -> i64) -> Option<T> {
    let pos = items.iter().position(|i| key(i) == id)?;
    Some(items.remove(pos))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;

    fn test_store() -> Arc<dyn Store> {
        let store = SqliteStore::memory().expect("Failed to create in-memory store");
        store.run_migrations().expect("migrations failed");
        Arc::new(store)
    }

    fn stored(store: &Arc<dyn Store>) -> SiteData {
        let raw = store.kv_get(CONTENT_KEY).expect("document not flushed");
        serde_json::from_str(&raw).unwrap()
    }

    /// Store whose writes always fail.
    pub(crate) struct BrokenStore;

    impl Store for BrokenStore {
        fn run_migrations(&self) -> Result<(), String> {
            Ok(())
        }
        fn backend_name(&self) -> &str {
            "broken"
        }
        fn kv_get(&self, _key: &str) -> Option<String> {
            None
        }
        fn kv_set(&self, _key: &str, _value: &str) -> Result<(), String> {
            Err("disk full".to_string())
        }
        fn kv_delete(&self, _key: &str) -> Result<(), String> {
            Ok(())
        }
        fn kv_keys(&self) -> Vec<String> {
            vec![]
        }
    }

    #[test]
    fn load_uses_defaults_without_writing() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        assert_eq!(site.snapshot(), SiteData::default());
        assert!(store.kv_get(CONTENT_KEY).is_none());
    }

    #[test]
    fn load_reads_existing_document() {
        let store = test_store();
        let mut doc = SiteData::default();
        doc.site_name = "Studio X".to_string();
        store
            .kv_set(CONTENT_KEY, &serde_json::to_string(&doc).unwrap())
            .unwrap();
        let site = SiteStore::load(store);
        assert_eq!(site.snapshot().site_name, "Studio X");
    }

    #[test]
    fn load_garbage_falls_back_to_defaults() {
        let store = test_store();
        store.kv_set(CONTENT_KEY, "{not json").unwrap();
        let site = SiteStore::load(store);
        assert_eq!(site.snapshot(), SiteData::default());
    }

    #[test]
    fn section_update_flushes_whole_document() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        let contact = Contact {
            email: "hej@ano.se".into(),
            phone: "1".into(),
            address: "2".into(),
            hours: "3".into(),
        };
        site.update_contact(contact.clone()).unwrap();
        let on_disk = stored(&store);
        assert_eq!(on_disk.contact, contact);
        // Other sections are written too, untouched.
        assert_eq!(on_disk.portfolio, SiteData::default().portfolio);
    }

    #[test]
    fn list_section_updates_flush() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));

        let mut services = SiteData::default().services;
        services.truncate(1);
        services[0].price = None;
        site.update_services(services.clone()).unwrap();
        assert_eq!(stored(&store).services, services);

        site.update_testimonials(Vec::new()).unwrap();
        let on_disk = stored(&store);
        assert!(on_disk.testimonials.is_empty());
        assert_eq!(on_disk.services, services);
    }

    #[test]
    fn add_after_maximum_id_is_rejected() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        let mut doc = SiteData::default();
        doc.services[0].id = i64::MAX;
        site.replace_all(doc.clone()).unwrap();

        let err = site
            .add_service(NewService {
                title: "Familj".into(),
                description: String::new(),
                icon: String::new(),
                price: None,
            })
            .unwrap_err();
        assert_eq!(err, ContentError::IdsExhausted);
        assert!(!err.edit_applied());
        assert_eq!(site.snapshot(), doc);
    }

    #[test]
    fn hero_update_replaces_section() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        site.update_hero(Hero {
            heading: "NY".into(),
            tagline: String::new(),
            image: "/uploads/ano/aa.jpg".into(),
            images: Some(vec!["/uploads/hero/1.jpg".into()]),
        })
        .unwrap();
        let hero = stored(&store).hero;
        assert_eq!(hero.heading, "NY");
        assert_eq!(hero.tagline, "");
        assert_eq!(hero.images.unwrap().len(), 1);
    }

    #[test]
    fn first_portfolio_item_gets_id_one() {
        let site = SiteStore::load(test_store());
        site.update_portfolio(Vec::new()).unwrap();
        let item = site
            .add_portfolio_item(NewPortfolioItem {
                title: "Fjäll".into(),
                category: "nature".into(),
                image: "https://example.com/a.jpg".into(),
            })
            .unwrap();
        assert_eq!(item.id, 1);
    }

    #[test]
    fn ids_do_not_fill_gaps() {
        let site = SiteStore::load(test_store());
        // defaults hold ids 1 and 2
        site.remove_portfolio_item(1).unwrap();
        let item = site
            .add_portfolio_item(NewPortfolioItem {
                title: "Ny".into(),
                category: "portraits".into(),
                image: "https://example.com/b.jpg".into(),
            })
            .unwrap();
        assert_eq!(item.id, 3);
        let ids: Vec<i64> = site.snapshot().portfolio.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn ids_reuse_after_removing_max() {
        let site = SiteStore::load(test_store());
        site.remove_service(3).unwrap();
        let s = site
            .add_service(NewService {
                title: "Familj".into(),
                description: String::new(),
                icon: String::new(),
                price: Some("  ".into()),
            })
            .unwrap();
        assert_eq!(s.id, 3);
        assert_eq!(s.icon, DEFAULT_SERVICE_ICON);
        assert_eq!(s.price, None);
    }

    #[test]
    fn portfolio_item_requires_image() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        let err = site
            .add_portfolio_item(NewPortfolioItem {
                title: "Utan bild".into(),
                category: "nature".into(),
                image: "  ".into(),
            })
            .unwrap_err();
        assert_eq!(err, ContentError::MissingImage);
        assert!(store.kv_get(CONTENT_KEY).is_none());
    }

    #[test]
    fn portfolio_item_rejects_unknown_category() {
        let site = SiteStore::load(test_store());
        let err = site
            .add_portfolio_item(NewPortfolioItem {
                title: "X".into(),
                category: "cars".into(),
                image: "https://example.com/c.jpg".into(),
            })
            .unwrap_err();
        assert_eq!(err, ContentError::UnknownCategory("cars".into()));
    }

    #[test]
    fn testimonial_requires_name_role_text() {
        let site = SiteStore::load(test_store());
        let err = site
            .add_testimonial(NewTestimonial {
                name: "Anna".into(),
                role: "".into(),
                text: "Bra".into(),
                avatar: String::new(),
            })
            .unwrap_err();
        assert_eq!(err, ContentError::MissingFields);
        assert_eq!(site.snapshot().testimonials.len(), 2);
    }

    #[test]
    fn removing_last_testimonial_leaves_empty_list() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        assert!(site.remove_testimonial(1).unwrap().is_some());
        assert!(site.remove_testimonial(2).unwrap().is_some());
        assert!(stored(&store).testimonials.is_empty());
        // unknown id is a no-op
        assert!(site.remove_testimonial(2).unwrap().is_none());
    }

    #[test]
    fn menu_collision_leaves_state_unchanged() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        let mut items = site.snapshot().menu_items;
        items[1].id = "home".into();
        let err = site.update_menu_items(items).unwrap_err();
        assert_eq!(err, ContentError::DuplicateMenuId("home".into()));
        assert_eq!(site.snapshot().menu_items, SiteData::default().menu_items);
        assert!(store.kv_get(CONTENT_KEY).is_none());
    }

    #[test]
    fn settings_saved_atomically() {
        let site = SiteStore::load(test_store());
        let mut items = site.snapshot().menu_items;
        items[2].id = "about".into();
        assert!(site.update_settings("Nytt namn", "", items).is_err());
        assert_eq!(site.snapshot().site_name, "ANO Fotografi");
    }

    #[test]
    fn add_and_remove_menu_items() {
        let site = SiteStore::load(test_store());
        site.add_menu_item("blogg", "Blogg").unwrap();
        assert_eq!(site.snapshot().menu_items.last().unwrap().id, "blogg");
        assert!(site.add_menu_item("blogg", "Igen").is_err());
        let removed = site.remove_menu_item("blogg").unwrap().unwrap();
        assert_eq!(removed.text, "Blogg");
        assert_eq!(site.snapshot().menu_items.len(), 6);
    }

    #[test]
    fn site_info_requires_name() {
        let site = SiteStore::load(test_store());
        assert_eq!(
            site.update_site_info("  ", "beskrivning").unwrap_err(),
            ContentError::MissingFields
        );
        site.update_site_info(" ANO ", " Foto ").unwrap();
        let doc = site.snapshot();
        assert_eq!(doc.site_name, "ANO");
        assert_eq!(doc.site_description, "Foto");
    }

    #[test]
    fn reset_and_replace() {
        let store = test_store();
        let site = SiteStore::load(Arc::clone(&store));
        site.update_portfolio(Vec::new()).unwrap();
        site.reset_to_defaults().unwrap();
        assert_eq!(stored(&store), SiteData::default());

        let mut doc = SiteData::default();
        doc.menu_items.push(doc.menu_items[0].clone());
        assert!(site.replace_all(doc).is_err());

        let mut doc = SiteData::default();
        doc.about.title = "Vem jag är".into();
        site.replace_all(doc).unwrap();
        assert_eq!(stored(&store).about.title, "Vem jag är");
    }

    #[test]
    fn flush_failure_is_reported_but_cache_updates() {
        let site = SiteStore::load(Arc::new(BrokenStore));
        let err = site.update_portfolio(Vec::new()).unwrap_err();
        assert!(matches!(err, ContentError::Persist(_)));
        assert!(err.edit_applied());
        assert!(site.snapshot().portfolio.is_empty());
    }
}
