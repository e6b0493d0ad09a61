use super::object::Value;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};

/// Index of a scope inside the environment arena.
pub type ScopeId = usize;

pub const GLOBAL_SCOPE: ScopeId = 0;

// Captured scopes allowed to pile up before the first collection.
const INITIAL_COLLECT_THRESHOLD: usize = 64;

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    parent: Option<ScopeId>,
    // A closure holds this scope or one of its descendants.
    captured: bool,
    live: bool,
}

/// Arena of scopes linked to their parents by index. Scopes are entered and
/// exited in stack order. An exited scope is freed at once unless a closure
/// captured it; captured scopes are reclaimed by `collect` once nothing
/// reachable refers to them. Freed slots are reused.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    free: Vec<ScopeId>,
    current: ScopeId,
    captured_count: usize,
    next_collect: usize,
}

impl Environment {
    pub fn new() -> Self {
        let global = Scope {
            captured: true,
            live: true,
            ..Scope::default()
        };

        Environment {
            scopes: vec![global],
            free: vec![],
            current: GLOBAL_SCOPE,
            captured_count: 0,
            next_collect: INITIAL_COLLECT_THRESHOLD,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of live scopes.
    pub fn len(&self) -> usize {
        self.scopes.len() - self.free.len()
    }

    /// Makes a fresh child of `parent` the current scope. Returns the scope
    /// that was current before, to be handed back to `exit`.
    pub fn enter(&mut self, parent: ScopeId) -> ScopeId {
        let scope = Scope {
            values: HashMap::new(),
            parent: Some(parent),
            captured: false,
            live: true,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.scopes[id] = scope;
                id
            }
            None => {
                self.scopes.push(scope);
                self.scopes.len() - 1
            }
        };

        let prev = self.current;
        self.current = id;
        trace!(scope = id, parent, "enter scope");
        prev
    }

    /// Leaves the current scope and restores `prev`.
    pub fn exit(&mut self, prev: ScopeId) {
        let scope = self.current;
        let freed = !self.scopes[scope].captured;
        if freed {
            self.release(scope);
        }
        trace!(scope, freed, "exit scope");
        self.current = prev;
    }

    /// Returns the current scope and keeps it, along with its ancestors,
    /// alive after it is exited.
    pub fn capture(&mut self) -> ScopeId {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if self.scopes[id].captured {
                break;
            }
            self.scopes[id].captured = true;
            self.captured_count += 1;
            scope = self.scopes[id].parent;
        }
        self.current
    }

    /// Runs `collect` once enough captured scopes have accumulated. Same
    /// contract as `collect`.
    pub fn collect_if_needed(&mut self) {
        if self.captured_count >= self.next_collect {
            self.collect();
            self.next_collect = INITIAL_COLLECT_THRESHOLD.max(self.captured_count * 2);
        }
    }

    /// Frees every scope not reachable from the current one. Only sound when
    /// no value lives outside the arena, i.e. between statements that run
    /// outside any function call.
    pub fn collect(&mut self) {
        let mut marked = vec![false; self.scopes.len()];
        let mut gray = vec![self.current];
        let mut seen_lists = HashSet::new();

        while let Some(id) = gray.pop() {
            if marked[id] {
                continue;
            }
            marked[id] = true;

            let scope = &self.scopes[id];
            gray.extend(scope.parent);
            for value in scope.values.values() {
                trace_value(value, &mut gray, &mut seen_lists);
            }
        }

        let mut freed = 0;
        for id in 0..self.scopes.len() {
            if self.scopes[id].live && !marked[id] {
                self.release(id);
                freed += 1;
            }
        }
        debug!(freed, live = self.len(), "collected scopes");
    }

    fn release(&mut self, id: ScopeId) {
        if self.scopes[id].captured {
            self.captured_count -= 1;
        }
        // Dropping the bindings here frees the values they own.
        self.scopes[id] = Scope::default();
        self.free.push(id);
    }

    /// Binds `name` in the current scope, shadowing outer bindings.
    pub fn define(&mut self, name: String, value: Value) {
        self.scopes[self.current].values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(value) = self.scopes[id].values.get(name) {
                return Some(value.clone());
            }
            scope = self.scopes[id].parent;
        }
        None
    }

    /// Updates the nearest binding of `name`. If no scope in the chain binds
    /// it, nothing is stored and the value is handed back.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), Value> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(slot) = self.scopes[id].values.get_mut(name) {
                *slot = value;
                return Ok(());
            }
            scope = self.scopes[id].parent;
        }
        Err(value)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Lists already traced in this collection, by address.
type SeenLists = HashSet<*const RefCell<Vec<Value>>>;

fn trace_value(value: &Value, gray: &mut Vec<ScopeId>, seen_lists: &mut SeenLists) {
    match value {
        Value::UserFunc(func) => gray.push(func.closure()),
        // Lists may contain themselves.
        Value::List(list) if seen_lists.insert(Rc::as_ptr(list)) => {
            for element in list.borrow().iter() {
                trace_value(element, gray, seen_lists);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::super::function::ZarnFn;
    use super::*;
    use crate::zarn_frontend::grammar::{FuncInfo, Identifier};
    use crate::zarn_frontend::span::Span;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_lookup_walks_outward() {
        let mut env = Environment::new();
        env.define("x".to_owned(), num(1.0));

        let prev = env.enter(env.current());
        assert_eq!(env.get("x"), Some(num(1.0)));

        env.define("x".to_owned(), num(2.0));
        assert_eq!(env.get("x"), Some(num(2.0)));

        env.exit(prev);
        assert_eq!(env.get("x"), Some(num(1.0)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let mut env = Environment::new();
        env.define("x".to_owned(), num(1.0));

        let prev = env.enter(env.current());
        assert!(env.assign("x", num(5.0)).is_ok());
        assert_eq!(env.assign("y", num(7.0)), Err(num(7.0)));
        assert_eq!(env.get("y"), None);
        env.exit(prev);

        assert_eq!(env.get("x"), Some(num(5.0)));
    }

    #[test]
    fn test_exited_scopes_are_freed() {
        let mut env = Environment::new();

        let prev = env.enter(GLOBAL_SCOPE);
        let inner = env.enter(env.current());
        assert_eq!(env.len(), 3);
        env.exit(inner);
        env.exit(prev);

        assert_eq!(env.len(), 1);
        assert_eq!(env.current(), GLOBAL_SCOPE);
    }

    #[test]
    fn test_captured_scope_survives_exit() {
        let mut env = Environment::new();

        let prev = env.enter(GLOBAL_SCOPE);
        env.define("count".to_owned(), num(0.0));
        let captured = env.capture();
        env.exit(prev);
        assert_eq!(env.len(), 2);

        // Later scopes are still reclaimed.
        let prev = env.enter(GLOBAL_SCOPE);
        env.exit(prev);
        assert_eq!(env.len(), 2);

        // Re-entering through the captured scope sees its bindings.
        let prev = env.enter(captured);
        assert_eq!(env.get("count"), Some(num(0.0)));
        assert!(env.assign("count", num(1.0)).is_ok());
        env.exit(prev);

        let prev = env.enter(captured);
        assert_eq!(env.get("count"), Some(num(1.0)));
        env.exit(prev);
    }

    fn closure_over(scope: ScopeId) -> Value {
        let ident = Identifier::new("f".to_owned(), Span::default());
        let info = FuncInfo::new(ident, vec![], vec![], Span::default());
        Value::UserFunc(ZarnFn::new(Rc::new(info), scope))
    }

    #[test]
    fn test_collect_frees_unreachable_captures() {
        let mut env = Environment::new();

        let prev = env.enter(GLOBAL_SCOPE);
        let kept = env.capture();
        env.exit(prev);

        // Holds the only closure over itself, so nothing outside reaches it.
        let prev = env.enter(GLOBAL_SCOPE);
        let dropped = env.capture();
        env.define("f".to_owned(), closure_over(dropped));
        env.exit(prev);

        // A global list that contains itself keeps the first scope alive.
        let list = Value::new_list(vec![closure_over(kept)]);
        if let Value::List(elements) = &list {
            elements.borrow_mut().push(list.clone());
        }
        env.define("keep".to_owned(), list);
        assert_eq!(env.len(), 3);

        env.collect();
        assert_eq!(env.len(), 2);

        let prev = env.enter(GLOBAL_SCOPE);
        assert_eq!(env.current(), dropped);
        env.exit(prev);
    }
}
