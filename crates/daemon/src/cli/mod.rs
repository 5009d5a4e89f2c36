pub mod args;
pub mod op;
pub mod ops;

pub use ops::{
    Daemon, Get, Health, Info, Init, List, Log, Peers, Profile, Publish, Remove, Rename, Render,
    Save, Search, Select, Status, Unpublish, Version,
};
