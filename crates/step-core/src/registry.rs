//! Registro de componentes.
//!
//! Asocia el nombre de cada componente con su implementación y metadata
//! (imagen de contenedor, inputs). El builder toma la metadata para el
//! documento; el runner local y el subcomando `exec` resuelven la función a
//! partir del nombre, igual que el executor externo resuelve la imagen.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::component::{is_component_name, ComponentDefinition, ComponentSpec};
use crate::errors::DefinitionError;

#[derive(Default, Clone)]
pub struct ComponentRegistry {
    components: IndexMap<String, Arc<dyn ComponentDefinition>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un componente. Nombres repetidos o no-identificadores son error.
    pub fn register<C>(&mut self, component: C) -> Result<(), DefinitionError>
        where C: ComponentDefinition + 'static
    {
        self.register_arc(Arc::new(component))
    }

    pub fn register_arc(&mut self, component: Arc<dyn ComponentDefinition>) -> Result<(), DefinitionError> {
        let name = component.name().to_string();
        if !is_component_name(&name) {
            return Err(DefinitionError::InvalidComponentName(name));
        }
        if self.components.contains_key(&name) {
            return Err(DefinitionError::DuplicateComponent(name));
        }
        debug!("registry: register component '{}' (image {})", name, component.base_image());
        self.components.insert(name, component);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ComponentDefinition>> {
        self.components.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<dyn ComponentDefinition>, DefinitionError> {
        self.get(name).ok_or_else(|| DefinitionError::UnknownComponent(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Nombres en orden de registro.
    pub fn names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    pub fn specs(&self) -> Vec<ComponentSpec> {
        self.components.values().map(|c| c.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.components.keys()).finish()
    }
}
