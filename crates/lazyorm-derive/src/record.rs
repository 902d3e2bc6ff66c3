//! Record derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

struct RecordAttrs {
    table: Option<String>,
    name: Option<String>,
}

fn parse_struct_attrs(input: &DeriveInput) -> Result<RecordAttrs> {
    let mut attrs = RecordAttrs {
        table: None,
        name: None,
    };
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                check_ident(&lit)?;
                attrs.table = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `table` or `name`"))
            }
        })?;
    }
    Ok(attrs)
}

fn get_column_name(field: &syn::Field) -> Result<String> {
    let mut column = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                check_ident(&lit)?;
                column = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `column`"))
            }
        })?;
    }
    match (column, &field.ident) {
        (Some(column), _) => Ok(column),
        (None, Some(ident)) => Ok(ident.to_string()),
        (None, None) => Err(syn::Error::new_spanned(field, "expected a named field")),
    }
}

/// Same rule the runtime applies: dotted parts of `[A-Za-z0-9_]+`.
fn check_ident(lit: &LitStr) -> Result<()> {
    let value = lit.value();
    let valid = !value.is_empty()
        && value.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            lit,
            format!("invalid SQL identifier \"{value}\""),
        ))
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let attrs = parse_struct_attrs(&input)?;
    let record_name = attrs.name.unwrap_or_else(|| ident.to_string());
    let table = attrs.table.unwrap_or_else(|| ident.to_string());

    let mut field_idents = Vec::with_capacity(fields.len());
    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        field_idents.push(field.ident.clone());
        columns.push(get_column_name(field)?);
    }

    Ok(quote! {
        impl #impl_generics ::lazyorm::Record for #ident #ty_generics #where_clause {
            const NAME: &'static str = #record_name;
            const TABLE: &'static str = #table;
            const FIELDS: &'static [&'static str] = &[#(#columns),*];

            fn from_values(
                values: ::std::vec::Vec<::lazyorm::Value>,
            ) -> ::lazyorm::OrmResult<Self> {
                ::lazyorm::row::check_arity(
                    <Self as ::lazyorm::Record>::NAME,
                    <Self as ::lazyorm::Record>::FIELDS.len(),
                    values.len(),
                )?;
                let mut values = values.into_iter();
                ::std::result::Result::Ok(Self {
                    #(
                        #field_idents: ::lazyorm::row::decode_field(
                            <Self as ::lazyorm::Record>::NAME,
                            #columns,
                            values.next(),
                        )?,
                    )*
                })
            }

            fn to_values(&self) -> ::std::vec::Vec<::lazyorm::Value> {
                ::std::vec![
                    #(::lazyorm::Value::from(::std::clone::Clone::clone(&self.#field_idents))),*
                ]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(src: &str) -> Result<String> {
        let input: DeriveInput = syn::parse_str(src)?;
        expand(input).map(|ts| ts.to_string())
    }

    #[test]
    fn defaults_to_struct_name() {
        let out = expand_str("struct User { id: i64, name: String }").unwrap();
        assert_eq!(out.matches("\"User\"").count(), 2);
        assert!(out.contains("\"id\""));
        assert!(out.contains("\"name\""));
    }

    #[test]
    fn table_name_and_column_overrides() {
        let out = expand_str(
            r#"
            #[orm(table = "shop.users", name = "Customer")]
            struct User {
                id: i64,
                #[orm(column = "email_address")]
                email: Option<String>,
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("\"shop.users\""));
        assert!(out.contains("\"Customer\""));
        assert!(out.contains("\"email_address\""));
        assert!(!out.contains("\"email\""));
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(expand_str(r#"#[orm(table = "users; --")] struct U { id: i64 }"#).is_err());
        assert!(expand_str(r#"struct U { #[orm(column = "a b")] id: i64 }"#).is_err());
    }

    #[test]
    fn rejects_unknown_keys_and_shapes() {
        assert!(expand_str(r#"#[orm(schema = "x")] struct U { id: i64 }"#).is_err());
        assert!(expand_str("struct U(i64);").is_err());
        assert!(expand_str("enum E { A }").is_err());
    }
}
