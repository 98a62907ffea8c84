use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, Type};


fn is_time_series(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path.path.segments
            .last()
            .map(|segment| segment.ident == "TimeSeries")
            .unwrap_or(false),
        _ => false,
    }
}

fn trajectory_option(attrs: &[syn::Attribute]) -> Option<Ident> {
    attrs.iter()
        .filter(|attr| attr.path.is_ident("trajectory"))
        .find_map(|attr| attr.parse_args::<Ident>().ok())
}

/// Derive macro to implement `Trajectories` for a component, every field of type
/// `TimeSeries` is listed under its field name, fields marked with
/// `#[trajectory(flatten)]` contribute their own trajectories prefixed with the
/// field name, and fields marked with `#[trajectory(skip)]` are ignored
#[proc_macro_derive(Trajectories, attributes(trajectory))]
pub fn derive_trajectories(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    // Get the name of the struct we are deriving the trait for
    let name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new_spanned(name, "Trajectories requires named fields")
                    .to_compile_error()
                    .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "Trajectories can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut pushes = Vec::new();
    for field in fields.iter() {
        let field_name = match &field.ident {
            Some(ident) => ident,
            None => continue,
        };
        let label = field_name.to_string();

        match trajectory_option(&field.attrs) {
            Some(option) if option == "skip" => continue,
            Some(option) if option == "flatten" => {
                let nested = format_ident!("{}_trajectories", field_name);
                pushes.push(quote! {
                    let #nested = crate::series::Trajectories::trajectories(&self.#field_name);
                    output.extend(
                        #nested.into_iter()
                            .map(|(nested_name, series)| (format!("{}.{}", #label, nested_name), series))
                    );
                });
            },
            _ => {
                if is_time_series(&field.ty) {
                    pushes.push(quote! {
                        output.push((String::from(#label), &self.#field_name));
                    });
                }
            }
        }
    }

    // Generate the implementation of the trait
    let expanded = quote! {
        impl #impl_generics crate::series::Trajectories for #name #ty_generics #where_clause {
            fn trajectories(&self) -> Vec<(String, &crate::series::TimeSeries)> {
                let mut output: Vec<(String, &crate::series::TimeSeries)> = Vec::new();
                #(#pushes)*
                output
            }
        }
    };

    TokenStream::from(expanded)
}
