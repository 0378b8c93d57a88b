use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Type, parse_macro_input};

/// Derive macro for transform config parameter declarations.
///
/// Generates two methods on the annotated struct:
///
/// - `config_params() -> Vec<ConfigParam>`: parameter declarations.
/// - `from_config(&ConfigValues) -> Result<Self, PluginError>`: reads the options back.
///
/// The struct must implement `Default`.
///
/// # Example
///
/// ```ignore
/// #[derive(ConfigParams, Default)]
/// pub struct RenameConfig {
///     #[param(name = "field.current", required, importance = "high", description = "Field to rename")]
///     pub current: String,
/// }
/// ```
///
/// `name` defaults to the Rust field name; `importance` defaults to `"medium"`.
/// A non-required parameter takes its default from the struct's `Default`.
///
/// Every field must be a `String`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Parsed `#[param(...)]` attribute of one field.
struct ParamAttr {
    name: Option<String>,
    importance: Option<String>,
    description: Option<String>,
    required: bool,
}

fn parse_param_attr(field: &syn::Field) -> Result<ParamAttr, syn::Error> {
    let mut attr_out = ParamAttr {
        name: None,
        importance: None,
        description: None,
        required: false,
    };
    for attr in &field.attrs {
        if !attr.path().is_ident("param") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                attr_out.name = Some(value.value());
            } else if meta.path.is_ident("importance") {
                let value: LitStr = meta.value()?.parse()?;
                attr_out.importance = Some(value.value());
            } else if meta.path.is_ident("description") {
                let value: LitStr = meta.value()?.parse()?;
                attr_out.description = Some(value.value());
            } else if meta.path.is_ident("required") {
                attr_out.required = true;
            } else {
                return Err(meta.error("unknown param attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attr_out)
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ConfigParams only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ConfigParams only supports structs",
            ));
        }
    };

    let mut config_param_tokens = Vec::new();
    let mut from_config_tokens = Vec::new();

    for field in fields {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let field_ty = &field.ty;
        let attr = parse_param_attr(field)?;

        let param_name = attr.name.unwrap_or_else(|| field_ident.to_string());
        let description = attr.description.ok_or_else(|| {
            syn::Error::new_spanned(field_ident, "missing #[param(description = \"...\")]")
        })?;
        let required = attr.required;

        let importance_expr = match attr.importance.as_deref().unwrap_or("medium") {
            "high" => quote! { smt_api::config::Importance::High },
            "medium" => quote! { smt_api::config::Importance::Medium },
            "low" => quote! { smt_api::config::Importance::Low },
            other => {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    format!("unknown importance '{other}' (expected 'high', 'medium' or 'low')"),
                ));
            }
        };

        if type_ident_name(field_ty).as_deref() != Some("String") {
            return Err(syn::Error::new_spanned(
                field_ty,
                "ConfigParams fields must be String (options are strings)",
            ));
        }

        let default_expr = if required {
            quote! { None }
        } else {
            quote! { Some(__defaults.#field_ident.clone()) }
        };

        config_param_tokens.push(quote! {
            smt_api::config::ConfigParam {
                name: #param_name.to_string(),
                importance: #importance_expr,
                default: #default_expr,
                description: #description.to_string(),
            }
        });

        from_config_tokens.push(if required {
            quote! {
                result.#field_ident = __config
                    .get(#param_name)
                    .ok_or_else(|| {
                        smt_api::error::PluginError::config(format!(
                            "Missing required configuration \"{}\" which has no default value.",
                            #param_name
                        ))
                    })?
                    .to_string();
            }
        } else {
            quote! {
                if let Some(v) = __config.get(#param_name) {
                    result.#field_ident = v.to_string();
                }
            }
        });
    }

    Ok(quote! {
        impl #name {
            pub fn config_params() -> Vec<smt_api::config::ConfigParam> {
                #[allow(unused_variables)]
                let __defaults = Self::default();
                vec![
                    #(#config_param_tokens),*
                ]
            }

            pub fn from_config(
                __config: &smt_api::config::ConfigValues,
            ) -> Result<Self, smt_api::error::PluginError> {
                let mut result = Self::default();
                #(#from_config_tokens)*
                Ok(result)
            }
        }
    })
}

/// Extract the last path segment ident name from a type (e.g. `u64`, `String`).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}
