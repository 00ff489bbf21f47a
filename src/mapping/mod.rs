pub mod path_mapper;
