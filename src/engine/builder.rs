//! Builder for [`MappingEngine`].
//!
//! Only the identity graph and the schema registry are required; every
//! collaborator defaults to a no-op implementation, so an engine for
//! mappings that use neither derived nor virtual schemas nor passwords needs
//! no further wiring.

use std::sync::Arc;

use super::MappingEngine;
use crate::graph::{
    DerAttrEvaluator, IdentityGraph, NoopDerAttrEvaluator, NoopVirAttrCache, NoopVirAttrEvaluator,
    PasswordCipher, PasswordGenerator, RefusingPasswordGenerator, UndecodableCipher, VirAttrCache,
    VirAttrEvaluator,
};
use crate::schema::SchemaRegistry;
use crate::transform::TransformerRegistry;

/// Builder for [`MappingEngine`].
pub struct MappingEngineBuilder<G: IdentityGraph> {
    graph: G,
    schemas: SchemaRegistry,
    der_evaluator: Arc<dyn DerAttrEvaluator>,
    vir_evaluator: Arc<dyn VirAttrEvaluator>,
    vir_cache: Arc<dyn VirAttrCache>,
    cipher: Arc<dyn PasswordCipher>,
    password_generator: Arc<dyn PasswordGenerator>,
    transformers: TransformerRegistry,
}

impl<G: IdentityGraph> MappingEngineBuilder<G> {
    pub fn new(graph: G, schemas: SchemaRegistry) -> Self {
        Self {
            graph,
            schemas,
            der_evaluator: Arc::new(NoopDerAttrEvaluator),
            vir_evaluator: Arc::new(NoopVirAttrEvaluator),
            vir_cache: Arc::new(NoopVirAttrCache),
            cipher: Arc::new(UndecodableCipher),
            password_generator: Arc::new(RefusingPasswordGenerator),
            transformers: TransformerRegistry::with_builtins(),
        }
    }

    pub fn der_evaluator(mut self, evaluator: Arc<dyn DerAttrEvaluator>) -> Self {
        self.der_evaluator = evaluator;
        self
    }

    pub fn vir_evaluator(mut self, evaluator: Arc<dyn VirAttrEvaluator>) -> Self {
        self.vir_evaluator = evaluator;
        self
    }

    pub fn vir_cache(mut self, cache: Arc<dyn VirAttrCache>) -> Self {
        self.vir_cache = cache;
        self
    }

    pub fn cipher(mut self, cipher: Arc<dyn PasswordCipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn password_generator(mut self, generator: Arc<dyn PasswordGenerator>) -> Self {
        self.password_generator = generator;
        self
    }

    pub fn transformers(mut self, transformers: TransformerRegistry) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn build(self) -> MappingEngine<G> {
        MappingEngine {
            graph: self.graph,
            schemas: self.schemas,
            der_evaluator: self.der_evaluator,
            vir_evaluator: self.vir_evaluator,
            vir_cache: self.vir_cache,
            cipher: self.cipher,
            password_generator: self.password_generator,
            transformers: self.transformers,
        }
    }
}
