pub use crate::{
    embed::{
        embedder::{EmbedOutput, embed_markers},
        registry::{PathRegistry, TokenRecord, TokenTable},
        token::{Token, TokenKind},
    },
    mapping::path_mapper::map_page_paths,
    path::{
        resolve::{element_path, resolve_path},
        structural_path::{PathStep, StructuralPath},
    },
    pipeline::{
        config::MapperConfig,
        error::{DecoratorError, MapperError, PathError},
        init::{InitPhase, Initializer, initialize_mapper, initialize_session},
    },
    render::{
        decorator::{DecorationOptions, Decorator, IdentityDecorator},
        sandbox::{Sandbox, SandboxGlobals},
        simulator::simulate_render,
    },
    service::{
        mapper_service::{MappedPair, MappedSide, MapperService},
        session::EditSession,
    },
};

pub mod cli;
pub mod dom;
pub mod embed;
pub mod mapping;
pub mod path;
pub mod pipeline;
pub mod render;
pub mod service;
pub mod trace;
