//! [`Vehicle`]: a name-keyed, shared-ownership collection of
//! [`Component`]s that fans out lifecycle calls to each *unique* component
//! exactly once per step, even when several names alias the same instance.
//!
//! Grounded on `airssys-rt::broker::registry::ActorRegistry` for the
//! name-keyed shared-handle shape (a plain `HashMap` is enough here since,
//! unlike the actor registry, a `Vehicle` is only ever touched from the
//! single-threaded step loop — spec §5), and directly on
//! `original_source/runtime/src/cloe/vehicle.cpp` for the alias/dedup-by-id
//! fan-out semantics.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use cloe_core::error::CloeResult;
use cloe_core::model::Model;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{CloeError, ComponentId, Duration};

use crate::component::Component;

type SharedComponent = Arc<Mutex<dyn Component + Send>>;

/// A vehicle: a named bundle of components, addressable by name (including
/// aliases), that a simulator plugin populates during `enroll` and the step
/// executor drives once per step.
pub struct Vehicle {
    name: String,
    components: HashMap<String, SharedComponent>,
    /// Names in the order they were first bound, used both to give
    /// deterministic fan-out order and to resolve aliases back to their
    /// underlying id.
    order: Vec<String>,
    /// Once `true` (after [`Vehicle::start`] has run), `add`/`emplace`/
    /// `alias` are rejected: the component set is fixed for the run (spec
    /// §4.4, "post-start immutability").
    started: bool,
}

impl Vehicle {
    /// A fresh, empty vehicle.
    pub fn new(name: impl Into<String>) -> Self {
        Vehicle {
            name: name.into(),
            components: HashMap::new(),
            order: Vec::new(),
            started: false,
        }
    }

    /// Bind `component` under `key`. Fails with `DuplicateKey` if `key` is
    /// already bound, or once the vehicle has started.
    pub fn add(&mut self, key: impl Into<String>, component: SharedComponent) -> CloeResult<()> {
        let key = key.into();
        self.guard_mutation(&key)?;
        if self.components.contains_key(&key) {
            return Err(CloeError::duplicate_key(key));
        }
        self.order.push(key.clone());
        self.components.insert(key, component);
        Ok(())
    }

    /// Bind `component` under `key`, overwriting any existing binding
    /// (spec's `emplace` semantics: insert-or-replace, unlike `add`'s
    /// insert-or-fail).
    pub fn emplace(&mut self, key: impl Into<String>, component: SharedComponent) -> CloeResult<()> {
        let key = key.into();
        self.guard_mutation(&key)?;
        if !self.components.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.components.insert(key, component);
        Ok(())
    }

    /// Bind `alias` to the same shared component currently bound under
    /// `existing`. Fails if `existing` is unbound or `alias` is already
    /// bound.
    pub fn alias(&mut self, existing: &str, alias: impl Into<String>) -> CloeResult<()> {
        let shared = self.lookup(existing)?;
        self.add(alias, shared)
    }

    fn guard_mutation(&self, key: &str) -> CloeResult<()> {
        if self.started {
            return Err(CloeError::configuration(format!(
                "vehicle '{}' has already started; cannot bind '{key}'",
                self.name
            )));
        }
        Ok(())
    }

    fn lookup(&self, key: &str) -> CloeResult<SharedComponent> {
        self.components.get(key).cloned().ok_or_else(|| {
            let mut available: Vec<String> = self.components.keys().cloned().collect();
            available.sort();
            CloeError::unknown_key(key, available)
        })
    }

    /// The components bound under `key`, `Arc`-cloned so the caller can
    /// lock it independently of this vehicle.
    pub fn get(&self, key: &str) -> CloeResult<SharedComponent> {
        self.lookup(key)
    }

    /// A capability query: locks the component bound under `key` and
    /// downcasts it to `T`, failing with a descriptive trigger error if the
    /// component is a different concrete type.
    pub fn with_component<T, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> CloeResult<R>
    where
        T: Component + 'static,
    {
        let shared = self.lookup(key)?;
        let guard = shared.lock();
        let concrete = guard
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| {
                CloeError::trigger(format!(
                    "component '{key}' in vehicle '{}' is not of the requested type",
                    self.name
                ))
            })?;
        Ok(f(concrete))
    }

    /// Current bound names, including aliases, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// The unique components bound to this vehicle, in the order their
    /// canonical (first-bound) name was added — aliases of an
    /// already-seen id are skipped.
    fn unique_components(&self) -> Vec<SharedComponent> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for key in &self.order {
            if let Some(shared) = self.components.get(key) {
                let id = shared.lock().id();
                if seen.insert(id) {
                    out.push(shared.clone());
                }
            }
        }
        out
    }
}

impl Model for Vehicle {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().connect()?;
        }
        Ok(())
    }

    fn enroll(&mut self, registrar: &mut dyn Registrar) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().enroll(registrar)?;
        }
        Ok(())
    }

    fn start(&mut self, sync: &Sync) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().start(sync)?;
        }
        self.started = true;
        Ok(())
    }

    /// Fan out to every unique component and return the minimum of their
    /// reached times: the vehicle as a whole is only as far along as its
    /// slowest component (spec §4.4, §4.7 progress rule).
    fn process(&mut self, sync: &Sync) -> CloeResult<Duration> {
        let mut reached = sync.time();
        for c in self.unique_components() {
            let t = c.lock().process(sync)?;
            if t < reached {
                reached = t;
            }
        }
        Ok(reached)
    }

    fn pause(&mut self, sync: &Sync) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().pause(sync)?;
        }
        Ok(())
    }

    fn resume(&mut self, sync: &Sync) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().resume(sync)?;
        }
        Ok(())
    }

    fn stop(&mut self, sync: &Sync) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().stop(sync)?;
        }
        Ok(())
    }

    fn reset(&mut self) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().reset()?;
        }
        self.started = false;
        Ok(())
    }

    fn disconnect(&mut self) -> CloeResult<()> {
        for c in self.unique_components() {
            c.lock().disconnect()?;
        }
        Ok(())
    }

    fn abort(&mut self) {
        for c in self.unique_components() {
            c.lock().abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::test_support::StubComponent;

    fn shared(name: &str, signal: f64) -> SharedComponent {
        Arc::new(Mutex::new(StubComponent::new(name, signal)))
    }

    #[test]
    fn add_rejects_duplicate_keys() {
        let mut v = Vehicle::new("ego");
        v.add("radar", shared("radar", 1.0)).unwrap();
        assert!(v.add("radar", shared("radar", 2.0)).is_err());
    }

    #[test]
    fn emplace_overwrites_existing_binding() {
        let mut v = Vehicle::new("ego");
        v.add("radar", shared("radar", 1.0)).unwrap();
        v.emplace("radar", shared("radar2", 9.0)).unwrap();
        let got = v.get("radar").unwrap();
        assert_eq!(got.lock().active_state()["signal"], 9.0);
    }

    #[test]
    fn alias_shares_the_same_component() {
        let mut v = Vehicle::new("ego");
        v.add("radar", shared("radar", 5.0)).unwrap();
        v.alias("radar", "front_radar").unwrap();

        let original = v.get("radar").unwrap();
        let aliased = v.get("front_radar").unwrap();
        assert_eq!(original.lock().id(), aliased.lock().id());
    }

    #[test]
    fn process_fans_out_once_per_unique_component() {
        let mut v = Vehicle::new("ego");
        let radar = shared("radar", 1.0);
        v.add("radar", radar.clone()).unwrap();
        v.alias("radar", "front_radar").unwrap();
        v.add("camera", shared("camera", 2.0)).unwrap();

        let sync = Sync::new(Duration::from_millis(20), 1.0);
        v.process(&sync).unwrap();

        let calls = radar
            .lock()
            .as_any()
            .downcast_ref::<StubComponent>()
            .unwrap()
            .process_calls;
        assert_eq!(calls, 1);
    }

    #[test]
    fn post_start_mutation_is_rejected() {
        let mut v = Vehicle::new("ego");
        v.add("radar", shared("radar", 1.0)).unwrap();
        let sync = Sync::new(Duration::from_millis(20), 1.0);
        v.start(&sync).unwrap();
        assert!(v.add("camera", shared("camera", 1.0)).is_err());
    }

    #[test]
    fn with_component_downcasts_by_capability() {
        let mut v = Vehicle::new("ego");
        v.add("radar", shared("radar", 7.0)).unwrap();
        let signal = v
            .with_component::<StubComponent, _>("radar", |c| c.signal)
            .unwrap();
        assert_eq!(signal, 7.0);
    }

    #[test]
    fn unknown_key_lists_available_names() {
        let mut v = Vehicle::new("ego");
        v.add("radar", shared("radar", 1.0)).unwrap();
        let err = v.get("camera").unwrap_err();
        assert!(err.to_string().contains("radar"));
    }
}
