const HEADER: &str = include_str!("../include/torch_capi.h");

/// C declarations matching the exported `tcapi_*` symbols.
pub fn generate_header() -> String {
    HEADER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_declares_every_export() {
        let header = generate_header();
        for symbol in [
            "tcapi_tensor_from_data",
            "tcapi_tensor_destroy",
            "tcapi_tensor_to_string",
            "tcapi_string_free",
            "tcapi_tensor_dtype",
            "tcapi_tensor_ndimension",
            "tcapi_tensor_sizes",
            "tcapi_tensor_nbytes",
            "tcapi_tensor_data_ptr",
            "tcapi_tensor_data_copy",
            "tcapi_tensor_sum",
            "tcapi_tensor_grad",
            "tcapi_tensor_backward",
            "tcapi_tensor_add",
            "tcapi_last_error",
            "tcapi_live_handles",
            "tcapi_dtype_list",
            "tcapi_init_logging",
        ] {
            assert!(header.contains(symbol), "missing {}", symbol);
        }
    }

    #[test]
    fn header_type_codes_match_table() {
        let header = generate_header();
        for ty in crate::dtype::ElementType::all() {
            let line = format!("TCAPI_{} = {}", ty.name().to_uppercase(), ty.code());
            assert!(header.contains(&line), "missing {}", line);
        }
    }
}
