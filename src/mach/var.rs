use super::{Heap, HeapStr, Reservation, Val};
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Variable memory
///
/// Names ending in `$` hold strings, everything else holds numbers;
/// the kind is fixed by the name and enforced on every store. Array
/// elements live in the same table under a key built from the
/// subscripts. Slot storage is charged against the heap so a runaway
/// program hits OUT OF MEMORY instead of growing without bound.
#[derive(Debug)]
pub struct Vars {
    vars: HashMap<Rc<str>, Val>,
    dims: HashMap<Rc<str>, Vec<i64>>,
    charge: Reservation,
}

fn slot_cost(name: &str) -> usize {
    name.len() + std::mem::size_of::<Val>()
}

impl Vars {
    pub fn new(heap: &Heap) -> Result<Vars> {
        Ok(Vars {
            vars: HashMap::new(),
            dims: HashMap::new(),
            charge: heap.reserve(0)?,
        })
    }

    pub fn clear(&mut self) {
        self.vars.clear();
        self.dims.clear();
        self.charge.shrink(0);
    }

    /// Undefined variables read as zero or the empty string, by the
    /// name's kind.
    pub fn fetch(&self, heap: &Heap, name: &str) -> Result<Val> {
        match self.vars.get(name) {
            Some(val) => Ok(val.clone()),
            None => {
                if name.ends_with('$') {
                    Ok(Val::String(Rc::new(HeapStr::copy_of(heap, "")?)))
                } else {
                    Ok(Val::Number(0.0))
                }
            }
        }
    }

    pub fn store(&mut self, name: &str, value: Val) -> Result<()> {
        if name.ends_with('$') != value.is_string() {
            return Err(error!(TypeMismatch));
        }
        if let Some(slot) = self.vars.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        self.charge.resize(self.charge.size() + slot_cost(name))?;
        self.vars.insert(Rc::from(name), value);
        Ok(())
    }

    /// Drop a variable entirely; used when a FOR loop retires its
    /// counter.
    pub fn remove(&mut self, name: &str) {
        if self.vars.remove(name).is_some() {
            self.charge.shrink(self.charge.size() - slot_cost(name));
        }
    }

    pub fn fetch_element(
        &mut self,
        heap: &Heap,
        name: &str,
        subscripts: Vec<Val>,
    ) -> Result<Val> {
        let key = self.element_key(name, subscripts)?;
        self.fetch(heap, &key)
    }

    pub fn store_element(&mut self, name: &str, subscripts: Vec<Val>, value: Val) -> Result<()> {
        let key = self.element_key(name, subscripts)?;
        self.store(&key, value)
    }

    /// Arrays dimension themselves to 10 per subscript on first use;
    /// later references must keep the same rank.
    fn element_key(&mut self, name: &str, subscripts: Vec<Val>) -> Result<String> {
        let mut requested: Vec<i64> = vec![];
        for val in subscripts {
            requested.push(val.index()?);
        }
        if !self.dims.contains_key(name) {
            self.dims.insert(Rc::from(name), vec![10; requested.len()]);
        }
        let dimensioned = &self.dims[name];
        if dimensioned.len() != requested.len() {
            return Err(error!(SubscriptOutOfRange));
        }
        for (r, d) in requested.iter().zip(dimensioned) {
            if *r < 0 || r > d {
                return Err(error!(SubscriptOutOfRange));
            }
        }
        let mut key: String = requested.iter().map(|r| format!(",{}", r)).collect();
        key.push_str(&format!(",{}", name));
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn str_val(heap: &Heap, s: &str) -> Val {
        Val::String(Rc::new(HeapStr::copy_of(heap, s).unwrap()))
    }

    #[test]
    fn test_undefined_defaults() {
        let heap = Heap::default();
        let vars = Vars::new(&heap).unwrap();
        assert_eq!(vars.fetch(&heap, "A").unwrap(), Val::Number(0.0));
        assert_eq!(vars.fetch(&heap, "A$").unwrap(), str_val(&heap, ""));
    }

    #[test]
    fn test_kind_is_enforced() {
        let heap = Heap::default();
        let mut vars = Vars::new(&heap).unwrap();
        assert!(vars.store("A", Val::Number(1.0)).is_ok());
        assert!(vars.store("A$", str_val(&heap, "X")).is_ok());
        assert!(vars.store("A", str_val(&heap, "X")).is_err());
        assert!(vars.store("A$", Val::Number(1.0)).is_err());
    }

    #[test]
    fn test_remove() {
        let heap = Heap::default();
        let mut vars = Vars::new(&heap).unwrap();
        vars.store("I", Val::Number(4.0)).unwrap();
        vars.remove("I");
        assert_eq!(vars.fetch(&heap, "I").unwrap(), Val::Number(0.0));
    }

    #[test]
    fn test_array_elements_are_independent() {
        let heap = Heap::default();
        let mut vars = Vars::new(&heap).unwrap();
        vars.store_element("A", vec![Val::Number(1.0)], Val::Number(10.0))
            .unwrap();
        vars.store_element("A", vec![Val::Number(2.0)], Val::Number(20.0))
            .unwrap();
        assert_eq!(
            vars.fetch_element(&heap, "A", vec![Val::Number(1.0)]).unwrap(),
            Val::Number(10.0)
        );
        assert_eq!(
            vars.fetch_element(&heap, "A", vec![Val::Number(2.0)]).unwrap(),
            Val::Number(20.0)
        );
    }

    #[test]
    fn test_subscript_out_of_range() {
        let heap = Heap::default();
        let mut vars = Vars::new(&heap).unwrap();
        let err = vars
            .fetch_element(&heap, "A", vec![Val::Number(11.0)])
            .unwrap_err();
        assert_eq!(err.to_string(), "?SUBSCRIPT OUT OF RANGE ERROR");
        let err = vars
            .fetch_element(&heap, "A", vec![Val::Number(-1.0)])
            .unwrap_err();
        assert_eq!(err.to_string(), "?SUBSCRIPT OUT OF RANGE ERROR");
    }

    #[test]
    fn test_rank_is_fixed_on_first_use() {
        let heap = Heap::default();
        let mut vars = Vars::new(&heap).unwrap();
        vars.store_element(
            "G",
            vec![Val::Number(1.0), Val::Number(2.0)],
            Val::Number(5.0),
        )
        .unwrap();
        assert!(vars
            .fetch_element(&heap, "G", vec![Val::Number(1.0)])
            .is_err());
    }
}
