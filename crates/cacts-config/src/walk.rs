//! Generic traversal of resolved configuration objects.
//!
//! A [`StringPass`] rewrites string leaves; [`Walk`] carries a pass to every
//! string reachable from a value. Records list their own fields (and expose
//! them one at a time through [`Record`]), mappings visit their values,
//! sequences their elements. Everything else is left
//! untouched. Each leaf is visited once per walk and the pass output is not
//! fed back into the pass.

use crate::{ConfigError, ConfigResult};
use cacts_core::{BuildType, Machine, Project};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A transformation applied to every string leaf.
pub trait StringPass {
    /// Returns the replacement text, or `None` to keep `text` as is.
    fn apply(&self, text: &str) -> ConfigResult<Option<String>>;
}

/// Something a [`StringPass`] can be run over, in place.
pub trait Walk {
    fn walk(&mut self, pass: &dyn StringPass) -> ConfigResult<()>;
}

impl Walk for String {
    fn walk(&mut self, pass: &dyn StringPass) -> ConfigResult<()> {
        if let Some(replaced) = pass.apply(self)? {
            *self = replaced;
        }
        Ok(())
    }
}

impl<T: Walk> Walk for Option<T> {
    fn walk(&mut self, pass: &dyn StringPass) -> ConfigResult<()> {
        match self {
            Some(inner) => inner.walk(pass),
            None => Ok(()),
        }
    }
}

impl<T: Walk> Walk for Vec<T> {
    fn walk(&mut self, pass: &dyn StringPass) -> ConfigResult<()> {
        for item in self.iter_mut() {
            item.walk(pass)?;
        }
        Ok(())
    }
}

impl<K: Ord, V: Walk> Walk for BTreeMap<K, V> {
    fn walk(&mut self, pass: &dyn StringPass) -> ConfigResult<()> {
        for value in self.values_mut() {
            value.walk(pass)?;
        }
        Ok(())
    }
}

macro_rules! opaque {
    ($($ty:ty),*) => {
        $(
            impl Walk for $ty {
                fn walk(&mut self, _pass: &dyn StringPass) -> ConfigResult<()> {
                    Ok(())
                }
            }
        )*
    };
}

opaque!(bool, u32, i64, f64, PathBuf);

/// A record whose fields can be walked one at a time, in declaration order.
pub trait Record: Walk {
    /// Field names in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Walk a single field.
    fn walk_field(&mut self, field: &str, pass: &dyn StringPass) -> ConfigResult<()>;
}

macro_rules! record {
    ($ty:ty; $($field:ident),+ $(,)?) => {
        impl Record for $ty {
            fn field_names(&self) -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn walk_field(&mut self, field: &str, pass: &dyn StringPass) -> ConfigResult<()> {
                match field {
                    $(stringify!($field) => self.$field.walk(pass),)+
                    other => Err(ConfigError::Internal(format!(
                        "{} has no field '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }

        impl Walk for $ty {
            fn walk(&mut self, pass: &dyn StringPass) -> ConfigResult<()> {
                $( self.$field.walk(pass)?; )+
                Ok(())
            }
        }
    };
}

record!(Project;
    name,
    baselines_gen_label,
    baselines_cmp_label,
    baselines_summary_file,
    enable_baselines_cmake_option,
    cmake_vars_names,
    cdash,
    root_dir,
);

record!(Machine;
    name,
    num_bld_res,
    num_run_res,
    env_setup,
    gpu_arch,
);

record!(BuildType;
    name,
    longname,
    description,
    uses_baselines,
    on_by_default,
    cmake_args,
    compile_res_count,
    testing_res_count,
    baselines_missing,
);
