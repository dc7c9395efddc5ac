use super::interpreter::unexpected;
use super::{Interpreter, Value};
use crate::errors::RuntimeError;

impl<'p> Interpreter<'p> {
    /// Run a builtin handler against the value stack. Returns [None] when
    /// the name is not backed natively, in which case the caller pushes a
    /// regular frame.
    pub(super) fn call_builtin(&mut self, name: &str) -> Option<Result<(), RuntimeError>> {
        let result = match name {
            "assert" => self.builtin_assert(),
            "vec:push" => self.builtin_vec_push(),
            "vec:pop" => self.builtin_vec_pop(),
            "vec:get" => self.builtin_vec_get(),
            "vec:size" => self.builtin_vec_size(),
            "map:set" => self.builtin_map_set(),
            "map:get" => self.builtin_map_get(),
            "map:has_key" => self.builtin_map_has_key(),
            "map:size" => self.builtin_map_size(),
            _ => return None,
        };
        Some(result)
    }

    fn pop_vec(&mut self) -> Result<Vec<Value>, RuntimeError> {
        match self.pop()? {
            Value::Vec(values) => Ok(values),
            other => Err(unexpected("vec", &other)),
        }
    }

    fn pop_map(&mut self) -> Result<Vec<(Value, Value)>, RuntimeError> {
        match self.pop()? {
            Value::Map(pairs) => Ok(pairs),
            other => Err(unexpected("map", &other)),
        }
    }

    fn builtin_assert(&mut self) -> Result<(), RuntimeError> {
        if self.pop_bool()? {
            Ok(())
        } else {
            Err(RuntimeError::AssertionFailed)
        }
    }

    fn builtin_vec_push(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let mut values = self.pop_vec()?;
        values.push(value);
        self.push(Value::Vec(values));
        Ok(())
    }

    fn builtin_vec_pop(&mut self) -> Result<(), RuntimeError> {
        let mut values = self.pop_vec()?;
        let value = values.pop().ok_or(RuntimeError::IndexOutOfRange {
            index: 0,
            length: 0,
        })?;
        self.push(Value::Vec(values));
        self.push(value);
        Ok(())
    }

    fn builtin_vec_get(&mut self) -> Result<(), RuntimeError> {
        let index = self.pop_int()?;
        let values = self.pop_vec()?;
        let value = usize::try_from(index)
            .ok()
            .and_then(|index| values.get(index).cloned())
            .ok_or(RuntimeError::IndexOutOfRange {
                index,
                length: values.len(),
            })?;
        self.push(Value::Vec(values));
        self.push(value);
        Ok(())
    }

    fn builtin_vec_size(&mut self) -> Result<(), RuntimeError> {
        let values = self.pop_vec()?;
        let size = values.len() as i64;
        self.push(Value::Vec(values));
        self.push(Value::Int(size));
        Ok(())
    }

    fn builtin_map_set(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        let key = self.pop()?;
        let mut pairs = self.pop_map()?;
        match pairs.iter_mut().find(|(existing, _)| existing == &key) {
            Some((_, existing)) => *existing = value,
            None => pairs.push((key, value)),
        }
        self.push(Value::Map(pairs));
        Ok(())
    }

    fn builtin_map_get(&mut self) -> Result<(), RuntimeError> {
        let key = self.pop()?;
        let pairs = self.pop_map()?;
        let value = pairs
            .iter()
            .find(|(existing, _)| existing == &key)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| RuntimeError::KeyNotFound {
                key: format!("{}", key),
            })?;
        self.push(Value::Map(pairs));
        self.push(value);
        Ok(())
    }

    fn builtin_map_has_key(&mut self) -> Result<(), RuntimeError> {
        let key = self.pop()?;
        let pairs = self.pop_map()?;
        let has_key = pairs.iter().any(|(existing, _)| existing == &key);
        self.push(Value::Map(pairs));
        self.push(Value::Bool(has_key));
        Ok(())
    }

    fn builtin_map_size(&mut self) -> Result<(), RuntimeError> {
        let pairs = self.pop_map()?;
        let size = pairs.len() as i64;
        self.push(Value::Map(pairs));
        self.push(Value::Int(size));
        Ok(())
    }
}
