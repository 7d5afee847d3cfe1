use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, ReturnType, Stmt};

use crate::helpers::gpio_sensors_crate_path;

/// See `#[gpio_sensors_macros::runtime]` for details.
pub fn runtime_macro(item: TokenStream, test: bool) -> TokenStream {
    let gpio_sensors = gpio_sensors_crate_path();
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(item as ItemFn);

    let ItemFn {
        attrs,
        vis,
        mut sig,
        block,
    } = input;

    // The wrapped function is always async: `fn main()` works too.
    sig.asyncness = Some(Default::default());

    let mut stmts = block.stmts;

    // Check if the function has an explicit return type
    let has_return_type = match &sig.output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => match &**ty {
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => false,
            _ => true,
        },
    };

    // The trailing expression (if any) must be returned after all tasks are done.
    let return_expr = if has_return_type {
        match stmts.pop() {
            Some(Stmt::Expr(expr, None)) => Some(expr),
            Some(stmt) => {
                stmts.push(stmt);
                None
            }
            None => None,
        }
    } else {
        None
    };

    // Define the #[tokio::main] / #[tokio::test] tokio macro attribute.
    let tokio_main_attr = match test {
        true => quote! {
            #[#gpio_sensors::utils::tokio::test]
            #[serial_test::serial]
        },
        false => quote! {#[#gpio_sensors::utils::tokio::main]},
    };

    let mut body = vec![quote! {
        #gpio_sensors::utils::task::init_task_channel().await;
    }];

    body.extend(stmts.into_iter().map(|stmt| match stmt {
        // A null "()" trailing expression would swallow the code added below.
        Stmt::Expr(ref exp, None) => match exp {
            syn::Expr::Tuple(tuple) if tuple.elems.is_empty() => quote!(),
            _ => quote! { #exp; },
        },
        _ => quote! { #stmt },
    }));

    // Wait for all dynamically spawned tasks to complete.
    body.push(quote! {
        #gpio_sensors::utils::task::join_all().await;
    });

    if let Some(return_stmt) = return_expr {
        body.push(quote! { #return_stmt });
    }

    let expanded = quote! {
        #tokio_main_attr
        #(#attrs)*
        #vis #sig {
            #(#body)*
        }
    };

    TokenStream::from(expanded)
}
