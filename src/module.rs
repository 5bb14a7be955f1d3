//! The top-level compilation unit: a set of methods plus the global data segment.

use crate::method::Method;
use crate::types::DataType;
use crate::value::Value;

/// A named, module-scope storage location with a pointer type and an initializer.
#[derive(Clone, Debug)]
pub struct Global {
    pub name: String,
    pub pointee_type: DataType,
    pub alignment: u32,
    pub initializer: Value,
}

impl Global {
    pub fn new(name: impl Into<String>, pointee_type: DataType, alignment: u32, initializer: Value) -> Global {
        Global {
            name: name.into(),
            pointee_type,
            alignment,
            initializer,
        }
    }

    pub fn pointer_type(&self) -> DataType {
        DataType::pointer_to(self.pointee_type.clone(), crate::types::AddressSpace::Global, self.alignment)
    }
}

/// A full translation unit: every method that was compiled together, plus the globals
/// they may reference.
#[derive(Default)]
pub struct Module {
    pub methods: Vec<Method>,
    pub globals: Vec<Global>,
}

impl Module {
    pub fn new() -> Module {
        Module {
            methods: Vec::new(),
            globals: Vec::new(),
        }
    }

    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn find_method_mut(&mut self, name: &str) -> Option<&mut Method> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    pub fn kernels(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|m| m.is_kernel)
    }

    pub fn find_global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }
}
