pub mod hash_map_store;
