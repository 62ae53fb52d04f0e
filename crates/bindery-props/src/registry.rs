#![forbid(unsafe_code)]

//! Thread-local cache of property sets, keyed by bean type and scan options.
//!
//! Bean types opt in through [`HasPropertySet`]; the first lookup for a
//! `(type, options)` pair builds the set, and every later lookup returns the
//! structurally shared `Rc`. The cache is thread-local because the whole
//! engine is single-threaded; definitions inside a cached set still mutate
//! in place as dotted paths materialize.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::set::{PropertySet, PropertySetBuilder, ScanOptions};

/// A bean type that can describe its own property table.
pub trait HasPropertySet: Sized + 'static {
    /// Register every property of the type on `properties`.
    fn define(properties: &mut PropertySetBuilder<Self>);
}

#[derive(PartialEq, Eq, Hash)]
struct CacheKey {
    type_id: TypeId,
    options: ScanOptions,
}

thread_local! {
    static PROPERTY_SETS: RefCell<AHashMap<CacheKey, Rc<dyn Any>>> =
        RefCell::new(AHashMap::new());
}

/// The cached property set for `B` under default [`ScanOptions`].
#[must_use]
pub fn property_set_for<B: HasPropertySet>() -> Rc<PropertySet<B>> {
    property_set_with::<B>(ScanOptions::default())
}

/// The cached property set for `B` under explicit options. Identical
/// `(type, options)` pairs share one instance for the life of the thread.
#[must_use]
pub fn property_set_with<B: HasPropertySet>(options: ScanOptions) -> Rc<PropertySet<B>> {
    PROPERTY_SETS.with(|cache| {
        let key = CacheKey {
            type_id: TypeId::of::<B>(),
            options,
        };
        if let Some(existing) = cache.borrow().get(&key) {
            if let Ok(set) = Rc::clone(existing).downcast::<PropertySet<B>>() {
                return set;
            }
        }
        let mut builder = PropertySetBuilder::with_options(options);
        B::define(&mut builder);
        let set = Rc::new(builder.build());
        tracing::debug!(
            bean_type = set.type_name(),
            ?options,
            "built property set"
        );
        cache
            .borrow_mut()
            .insert(key, Rc::clone(&set) as Rc<dyn Any>);
        set
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        owner: String,
        balance: i64,
    }

    impl HasPropertySet for Account {
        fn define(properties: &mut PropertySetBuilder<Self>) {
            properties
                .property("owner", |a| a.owner.clone(), |a, v| a.owner = v)
                .property("balance", |a| a.balance, |a, v| a.balance = v);
        }
    }

    #[test]
    fn identical_lookups_share_one_set() {
        let a = property_set_for::<Account>();
        let b = property_set_for::<Account>();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_options_build_distinct_sets() {
        let a = property_set_for::<Account>();
        let b = property_set_with::<Account>(ScanOptions {
            nested: false,
            max_depth: 2,
        });
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(b.options().max_depth, 2);
    }

    #[test]
    fn cached_set_resolves_registered_properties() {
        let set = property_set_for::<Account>();
        let def = set.resolve("balance").unwrap();
        let account = Account {
            owner: "Bo".to_owned(),
            balance: 12,
        };
        assert_eq!(def.get(&account).get::<i64>(), Some(12));
    }
}
