use crate::api::decl::{ArrayDecl, FunctionDecl, HandleDecl, StructDecl};
use crate::api::generator::{Generator, GENERATED_MARKER};
use crate::api::header::Header;
use crate::api::record::Record;
use crate::codegen::classify::{classify, ParamKind, ScalarType, RULES};
use crate::codegen::gen_func::GenFunction;
use crate::codegen::gen_handle::GenHandle;
use crate::codegen::gen_struct::GenStruct;
use crate::error::Error;

const ALLOCATOR: (&str, &str) = ("pAllocator", "const VkAllocationCallbacks *");

/// A small slice of `vulkan_core.h` as the AST provider reports it
fn vulkan() -> Header {
    let mut records = Vec::new();
    for handle in [
        "VkInstance",
        "VkPhysicalDevice",
        "VkDevice",
        "VkImage",
        "VkImageView",
        "VkPipeline",
    ] {
        records.push(Record::opaque(format!("{handle}_T")));
        records.push(Record::typedef(handle, format!("struct {handle}_T *")));
    }
    records.extend([
        Record::typedef("VkBool32", "uint32_t"),
        Record::typedef("VkFlags", "uint32_t"),
        Record::typedef("VkDeviceSize", "uint64_t"),
        Record::typedef("VkImageViewCreateFlags", "VkFlags"),
        Record::typedef("PFN_vkVoidFunction", "void (*)(void)"),
        Record::enumeration("VkResult", ["VK_SUCCESS", "VK_INCOMPLETE"]),
        Record::enumeration("VkFormat", ["VK_FORMAT_UNDEFINED", "VK_FORMAT_R8G8B8A8_UNORM"]),
        Record::enumeration("VkImageViewType", ["VK_IMAGE_VIEW_TYPE_2D"]),
        Record::enumeration("VkImageLayout", ["VK_IMAGE_LAYOUT_UNDEFINED"]),
        Record::enumeration(
            "VkStructureType",
            [
                "VK_STRUCTURE_TYPE_IMAGE_VIEW_CREATE_INFO",
                "VK_STRUCTURE_TYPE_DEVICE_QUEUE_CREATE_INFO",
                "VK_STRUCTURE_TYPE_DEVICE_CREATE_INFO",
                "VK_STRUCTURE_TYPE_BUFFER_CREATE_INFO",
                "VK_STRUCTURE_TYPE_SHADER_MODULE_CREATE_INFO",
                "VK_STRUCTURE_TYPE_GRAPHICS_PIPELINE_CREATE_INFO",
                "VK_STRUCTURE_TYPE_FOO_CREATE_INFO",
            ],
        ),
        Record::structure("VkAllocationCallbacks", [("pUserData", "void *")]),
        Record::structure("VkExtent2D", [("width", "uint32_t"), ("height", "uint32_t")]),
        Record::structure(
            "VkImageViewCreateInfo",
            [
                ("sType", "VkStructureType"),
                ("pNext", "const void *"),
                ("flags", "VkImageViewCreateFlags"),
                ("image", "VkImage"),
                ("viewType", "VkImageViewType"),
                ("format", "VkFormat"),
            ],
        ),
        Record::structure(
            "VkDeviceQueueCreateInfo",
            [
                ("sType", "VkStructureType"),
                ("pNext", "const void *"),
                ("flags", "VkFlags"),
                ("queueFamilyIndex", "uint32_t"),
                ("queueCount", "uint32_t"),
                ("pQueuePriorities", "const float *"),
            ],
        ),
        Record::structure(
            "VkPhysicalDeviceFeatures",
            [
                ("robustBufferAccess", "VkBool32"),
                ("fullDrawIndexUint32", "VkBool32"),
            ],
        ),
        Record::structure(
            "VkDeviceCreateInfo",
            [
                ("sType", "VkStructureType"),
                ("pNext", "const void *"),
                ("flags", "VkFlags"),
                ("queueCreateInfoCount", "uint32_t"),
                ("pQueueCreateInfos", "const VkDeviceQueueCreateInfo *"),
                ("enabledExtensionCount", "uint32_t"),
                ("ppEnabledExtensionNames", "const char *const *"),
                ("pEnabledFeatures", "const VkPhysicalDeviceFeatures *"),
            ],
        ),
        Record::structure(
            "VkBufferCreateInfo",
            [
                ("sType", "VkStructureType"),
                ("pNext", "const void *"),
                ("size", "VkDeviceSize"),
                ("queueFamilyIndexCount", "uint32_t"),
                ("pQueueFamilyIndices", "const uint32_t *"),
            ],
        ),
        Record::structure(
            "VkShaderModuleCreateInfo",
            [
                ("sType", "VkStructureType"),
                ("pNext", "const void *"),
                ("flags", "VkFlags"),
                ("codeSize", "size_t"),
                ("pCode", "const uint32_t *"),
            ],
        ),
        Record::structure(
            "VkAttachmentReference",
            [("attachment", "uint32_t"), ("layout", "VkImageLayout")],
        ),
        Record::structure(
            "VkSubpassDescription",
            [
                ("colorAttachmentCount", "uint32_t"),
                ("pColorAttachments", "const VkAttachmentReference *"),
                ("pResolveAttachments", "const VkAttachmentReference *"),
            ],
        ),
        Record::structure(
            "VkPhysicalDeviceProperties",
            [("apiVersion", "uint32_t"), ("deviceName", "char [256]")],
        ),
        Record::structure(
            "VkQueueFamilyProperties",
            [("queueFlags", "VkFlags"), ("queueCount", "uint32_t")],
        ),
        Record::structure(
            "VkGraphicsPipelineCreateInfo",
            [
                ("sType", "VkStructureType"),
                ("pNext", "const void *"),
                ("flags", "VkFlags"),
            ],
        ),
        Record::function(
            "vkCreateImageView",
            "VkResult (VkDevice, const VkImageViewCreateInfo *, const VkAllocationCallbacks *, VkImageView *)",
            [
                ("device", "VkDevice"),
                ("pCreateInfo", "const VkImageViewCreateInfo *"),
                ALLOCATOR,
                ("pView", "VkImageView *"),
            ],
        ),
        Record::function(
            "vkDestroyImageView",
            "void (VkDevice, VkImageView, const VkAllocationCallbacks *)",
            [("device", "VkDevice"), ("imageView", "VkImageView"), ALLOCATOR],
        ),
        Record::function(
            "vkEnumeratePhysicalDevices",
            "VkResult (VkInstance, uint32_t *, VkPhysicalDevice *)",
            [
                ("instance", "VkInstance"),
                ("pPhysicalDeviceCount", "uint32_t *"),
                ("pPhysicalDevices", "VkPhysicalDevice *"),
            ],
        ),
        Record::function(
            "vkGetPhysicalDeviceProperties",
            "void (VkPhysicalDevice, VkPhysicalDeviceProperties *)",
            [
                ("physicalDevice", "VkPhysicalDevice"),
                ("pProperties", "VkPhysicalDeviceProperties *"),
            ],
        ),
        Record::function(
            "vkGetPhysicalDeviceQueueFamilyProperties",
            "void (VkPhysicalDevice, uint32_t *, VkQueueFamilyProperties *)",
            [
                ("physicalDevice", "VkPhysicalDevice"),
                ("pQueueFamilyPropertyCount", "uint32_t *"),
                ("pQueueFamilyProperties", "VkQueueFamilyProperties *"),
            ],
        ),
        Record::function(
            "vkCreateGraphicsPipelines",
            "VkResult (VkDevice, uint32_t, const VkGraphicsPipelineCreateInfo *, const VkAllocationCallbacks *, VkPipeline *)",
            [
                ("device", "VkDevice"),
                ("createInfoCount", "uint32_t"),
                ("pCreateInfos", "const VkGraphicsPipelineCreateInfo *"),
                ALLOCATOR,
                ("pPipelines", "VkPipeline *"),
            ],
        ),
        Record::function(
            "vkDestroyPipeline",
            "void (VkDevice, VkPipeline, const VkAllocationCallbacks *)",
            [("device", "VkDevice"), ("pipeline", "VkPipeline"), ALLOCATOR],
        ),
        Record::function(
            "vkDeviceWaitIdle",
            "VkResult (VkDevice)",
            [("device", "VkDevice")],
        ),
        Record::function(
            "vkGetDeviceProcAddr",
            "PFN_vkVoidFunction (VkDevice, const char *)",
            [("device", "VkDevice"), ("pName", "const char *")],
        ),
        Record::function(
            "vkGetTwoCounts",
            "void (VkDevice, uint32_t *, uint32_t *)",
            [
                ("device", "VkDevice"),
                ("pFirst", "uint32_t *"),
                ("pSecond", "uint32_t *"),
            ],
        ),
        Record::function(
            "vkGetCountAndValue",
            "uint32_t (VkDevice, uint32_t *)",
            [("device", "VkDevice"), ("pValue", "uint32_t *")],
        ),
    ]);
    records.into_iter().collect()
}

fn trimmed(lines: &[String]) -> Vec<&str> {
    lines.iter().map(|l| l.trim()).collect()
}

fn position(lines: &[String], line: &str) -> usize {
    lines
        .iter()
        .position(|l| l.trim() == line)
        .unwrap_or_else(|| panic!("`{line}` not found in:\n{}", lines.join("\n")))
}

fn position_starting(lines: &[String], prefix: &str) -> usize {
    lines
        .iter()
        .position(|l| l.trim().starts_with(prefix))
        .unwrap_or_else(|| panic!("no line starting with `{prefix}` in:\n{}", lines.join("\n")))
}

fn struct_lines(decl: StructDecl) -> Vec<String> {
    GenStruct::new(&decl, &vulkan()).unwrap().generate().unwrap()
}

fn handle_lines(decl: HandleDecl) -> Vec<String> {
    GenHandle::new(&decl, &vulkan(), "vk", &[])
        .unwrap()
        .generate()
        .unwrap()
}

fn function_lines(decl: FunctionDecl) -> Vec<String> {
    let header = vulkan();
    let function = header.function(&decl.name).unwrap();
    GenFunction::new(function, &decl, &header)
        .unwrap()
        .generate()
        .unwrap()
}

// Classification

#[test]
fn test_rule_order() {
    let names = RULES.iter().map(|(name, _)| *name).collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            "allocator",
            "chain link",
            "handle",
            "handle pointer",
            "struct",
            "struct pointer",
            "enum",
            "enum pointer",
            "string",
            "scalar",
        ]
    );
}

#[test]
fn test_struct_shaped_handle_is_handle() {
    let header: Header = [
        Record::opaque("VkFoo_T"),
        Record::structure("VkFoo_T", [("value", "uint32_t")]),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        classify("foo", "struct VkFoo_T *", &header).unwrap(),
        ParamKind::Handle {
            vk: "VkFoo".to_string()
        }
    );
    assert_eq!(
        classify("pFoo", "struct VkFoo_T **", &header).unwrap(),
        ParamKind::HandlePtr {
            vk: "VkFoo".to_string()
        }
    );
}

#[test]
fn test_allocator_before_struct_pointer() {
    let header = vulkan();
    assert_eq!(
        classify(ALLOCATOR.0, ALLOCATOR.1, &header).unwrap(),
        ParamKind::Allocator
    );
}

#[test]
fn test_classify_kinds() {
    let header = vulkan();
    let cases = [
        ("sType", "VkStructureType", ParamKind::ChainType),
        ("pNext", "const void *", ParamKind::ChainNext),
        (
            "device",
            "VkDevice",
            ParamKind::Handle {
                vk: "VkDevice".to_string(),
            },
        ),
        (
            "pView",
            "VkImageView *",
            ParamKind::HandlePtr {
                vk: "VkImageView".to_string(),
            },
        ),
        (
            "extent",
            "VkExtent2D",
            ParamKind::Struct {
                vk: "VkExtent2D".to_string(),
            },
        ),
        (
            "pCreateInfo",
            "const VkImageViewCreateInfo *",
            ParamKind::StructPtr {
                vk: "VkImageViewCreateInfo".to_string(),
            },
        ),
        (
            "format",
            "VkFormat",
            ParamKind::Enum {
                vk: "VkFormat".to_string(),
            },
        ),
        (
            "pFormat",
            "VkFormat *",
            ParamKind::EnumPtr {
                vk: "VkFormat".to_string(),
            },
        ),
        ("pName", "const char *", ParamKind::String),
        ("deviceName", "char [256]", ParamKind::FixedString { size: 256 }),
        ("ppEnabledLayerNames", "const char *const *", ParamKind::StringPtrArray),
        ("flags", "VkImageViewCreateFlags", ParamKind::Scalar(ScalarType::Uint32)),
        ("size", "VkDeviceSize", ParamKind::Scalar(ScalarType::Uint64)),
        ("codeSize", "size_t", ParamKind::Scalar(ScalarType::Uint64)),
        ("robustBufferAccess", "VkBool32", ParamKind::Scalar(ScalarType::Bool32)),
        ("pCount", "uint32_t *", ParamKind::ScalarPtr(ScalarType::Uint32)),
        (
            "blendConstants",
            "float [4]",
            ParamKind::FixedArray {
                scalar: ScalarType::Float,
                size: 4,
            },
        ),
    ];
    for (name, c_type, expected) in cases {
        assert_eq!(classify(name, c_type, &header).unwrap(), expected, "{name}: {c_type}");
    }
}

#[test]
fn test_classification_is_pure() {
    let header = vulkan();
    let first = classify("pQueueFamilyIndices", "const uint32_t *", &header).unwrap();
    let second = classify("pQueueFamilyIndices", "const uint32_t *", &header).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unknown_type() {
    let header = vulkan();
    let err = classify("pfnCallback", "PFN_vkDebugReportCallbackEXT", &header).unwrap_err();
    match err {
        Error::UnknownType { name, c_type } => {
            assert_eq!(name, "pfnCallback");
            assert_eq!(c_type, "PFN_vkDebugReportCallbackEXT");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// Struct generator

#[test]
fn test_items_field_with_count() {
    let lines = struct_lines(
        StructDecl::new("VkBufferCreateInfo").declare_array("queueFamilyIndexCount", "pQueueFamilyIndices"),
    );
    let lines = trimmed(&lines);
    assert!(lines.contains(&"queue_family_indices : array<uint>"));
    assert!(lines.contains(&"size : uint64"));
    // count and chain fields are not part of the wrapper layout
    assert!(!lines.iter().any(|l| l.starts_with("queue_family_index_count :")));
    assert!(!lines.iter().any(|l| l.starts_with("s_type") || l.starts_with("next")));
    assert!(lines.contains(&"queueFamilyIndexCount = uint(length(boost_struct.queue_family_indices)),"));
    assert!(lines.contains(&"pQueueFamilyIndices = array_addr_unsafe(boost_struct.queue_family_indices)"));
    assert!(lines.contains(
        &"queue_family_indices = [{for i in range(int(vk_struct.queueFamilyIndexCount)); unsafe(vk_struct.pQueueFamilyIndices[i])}]"
    ));
}

#[test]
fn test_chain_fields_are_synthesized() {
    let lines = struct_lines(StructDecl::new("VkImageViewCreateInfo"));
    let lines = trimmed(&lines);
    assert!(lines.contains(&"sType = VkStructureType VK_STRUCTURE_TYPE_IMAGE_VIEW_CREATE_INFO,"));
    assert!(lines.contains(&"pNext = null,"));
    assert!(lines.contains(&"image = boost_struct.image.image,"));
    assert!(lines.contains(&"image = [[Image image=vk_struct.image]],"));
    assert!(lines.contains(&"view_type : VkImageViewType"));
}

#[test]
fn test_view_flag_alternates() {
    let lines = struct_lines(StructDecl::new("VkExtent2D"));
    let create = position(&lines, "def vk_view_create_unsafe(var boost_struct : Extent2D) : VkExtent2D");
    let destroy = position(&lines, "def vk_view_destroy(var boost_struct : Extent2D)");
    assert_eq!(lines[create + 1].trim(), "assert(!boost_struct._vk_view__active)");
    assert_eq!(lines[create + 2].trim(), "boost_struct._vk_view__active = true");
    assert_eq!(lines.last().unwrap().trim(), "boost_struct._vk_view__active = false");
    assert!(create < destroy);
    assert!(trimmed(&lines).contains(&"_vk_view__active : bool"));
}

#[test]
fn test_round_trip_fields_match() {
    let mut header = vulkan();
    header.insert(Record::structure(
        "VkRenderTargetInfo",
        [
            ("image", "VkImage"),
            ("format", "VkFormat"),
            ("extent", "VkExtent2D"),
            ("clearColor", "float [4]"),
            ("blendEnable", "VkBool32"),
        ],
    ));
    let lines = GenStruct::new(&StructDecl::new("VkRenderTargetInfo"), &header)
        .unwrap()
        .generate()
        .unwrap();
    let lines = trimmed(&lines);
    for member in [
        "image : Image",
        "format : VkFormat",
        "extent : Extent2D",
        "clear_color : float[4]",
        "blend_enable : bool",
    ] {
        assert!(lines.contains(&member), "{member}");
    }
    for (to_boost, to_vk) in [
        ("image = [[Image image=vk_struct.image]]", "image = boost_struct.image.image"),
        ("format = vk_struct.format", "format = boost_struct.format"),
        (
            "extent = vk_struct.extent |> vk_value_to_boost()",
            "extent = boost_struct.extent |> vk_view_create_unsafe()",
        ),
        ("clear_color = vk_struct.clearColor", "clearColor = boost_struct.clear_color"),
        (
            "blend_enable = vk_struct.blendEnable != 0u",
            "blendEnable = boost_struct.blend_enable ? 1u : 0u",
        ),
    ] {
        assert!(
            lines.iter().any(|l| l.trim_end_matches(',') == to_boost),
            "{to_boost}"
        );
        assert!(lines.iter().any(|l| l.trim_end_matches(',') == to_vk), "{to_vk}");
    }
    assert!(lines.contains(&"boost_struct.extent |> vk_view_destroy()"));

    let lines = struct_lines(StructDecl::new("VkPhysicalDeviceFeatures"));
    let lines = trimmed(&lines);
    for (c_name, boost_name) in [
        ("robustBufferAccess", "robust_buffer_access"),
        ("fullDrawIndexUint32", "full_draw_index_uint_32"),
    ] {
        let to_boost = format!("{boost_name} = vk_struct.{c_name} != 0u");
        let to_vk = format!("{c_name} = boost_struct.{boost_name} ? 1u : 0u");
        assert!(
            lines.iter().any(|l| l.trim_end_matches(',') == to_boost),
            "{to_boost}"
        );
        assert!(lines.iter().any(|l| l.trim_end_matches(',') == to_vk), "{to_vk}");
    }
}

#[test]
fn test_bool32_fixed_array_is_unsupported() {
    let header: Header = [
        Record::typedef("VkBool32", "uint32_t"),
        Record::structure(
            "VkSampleEnableInfo",
            [("sampleCount", "uint32_t"), ("enables", "VkBool32 [4]")],
        ),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        classify("enables", "VkBool32 [4]", &header).unwrap(),
        ParamKind::FixedArray {
            scalar: ScalarType::Bool32,
            size: 4
        }
    );
    for decl in [
        StructDecl::new("VkSampleEnableInfo"),
        StructDecl::new("VkSampleEnableInfo").vk_to_boost(false),
        StructDecl::new("VkSampleEnableInfo").boost_to_vk(false),
    ] {
        let err = GenStruct::new(&decl, &header).unwrap_err();
        assert!(
            matches!(&err, Error::Unsupported { message, .. } if message.contains("`enables`")),
            "{err}"
        );
    }
    let lines = GenStruct::new(
        &StructDecl::new("VkSampleEnableInfo").ignore_field("enables"),
        &header,
    )
    .unwrap()
    .generate()
    .unwrap();
    assert!(trimmed(&lines).contains(&"sample_count : uint"));
}

#[test]
fn test_nested_views_are_kept_until_destroy() {
    let lines = struct_lines(
        StructDecl::new("VkDeviceCreateInfo")
            .vk_to_boost(false)
            .declare_array("queueCreateInfoCount", "pQueueCreateInfos")
            .declare_array("enabledExtensionCount", "ppEnabledExtensionNames"),
    );
    let lines = trimmed(&lines);
    assert!(lines.contains(&"queue_create_infos : array<DeviceQueueCreateInfo>"));
    assert!(lines.contains(&"enabled_extension_names : array<string>"));
    assert!(lines.contains(&"enabled_features : PhysicalDeviceFeatures?"));
    assert!(lines.contains(&"_vk_view_p_queue_create_infos : array<VkDeviceQueueCreateInfo>"));
    assert!(lines.contains(&"_vk_view_p_enabled_features : VkPhysicalDeviceFeatures"));
    assert!(lines.contains(
        &"boost_struct._vk_view_p_queue_create_infos <- [{for item in boost_struct.queue_create_infos; item |> vk_view_create_unsafe()}]"
    ));
    assert!(lines.contains(
        &"pEnabledFeatures = boost_struct.enabled_features != null ? unsafe(addr(boost_struct._vk_view_p_enabled_features)) : null"
    ));
    assert!(lines.contains(&"ppEnabledExtensionNames = array_addr_unsafe(boost_struct.enabled_extension_names),"));
    assert!(!lines.iter().any(|l| l.starts_with("def vk_value_to_boost")));

    let destroy = lines
        .iter()
        .position(|l| l.starts_with("def vk_view_destroy"))
        .unwrap();
    assert_eq!(
        &lines[destroy + 1..],
        [
            "for item in boost_struct.queue_create_infos",
            "item |> vk_view_destroy()",
            "delete boost_struct._vk_view_p_queue_create_infos",
            "if boost_struct.enabled_features != null",
            "(*boost_struct.enabled_features) |> vk_view_destroy()",
            "boost_struct._vk_view__active = false",
        ]
    );
}

#[test]
fn test_single_struct_pointer_has_no_to_boost() {
    let err = GenStruct::new(
        &StructDecl::new("VkDeviceCreateInfo")
            .declare_array("queueCreateInfoCount", "pQueueCreateInfos")
            .declare_array("enabledExtensionCount", "ppEnabledExtensionNames"),
        &vulkan(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }), "{err}");
}

#[test]
fn test_fixed_string_is_read_only() {
    let header = vulkan();
    let err = GenStruct::new(&StructDecl::new("VkPhysicalDeviceProperties"), &header).unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }), "{err}");

    let lines = GenStruct::new(
        &StructDecl::new("VkPhysicalDeviceProperties").boost_to_vk(false),
        &header,
    )
    .unwrap()
    .generate()
    .unwrap();
    let lines = trimmed(&lines);
    assert!(lines.contains(&"device_name : string"));
    assert!(lines.contains(&"device_name = string(unsafe(addr(vk_struct.deviceName[0])))"));
    assert!(!lines.contains(&"_vk_view__active : bool"));
}

#[test]
fn test_forced_item_type() {
    let lines = struct_lines(
        StructDecl::new("VkShaderModuleCreateInfo")
            .vk_to_boost(false)
            .array(ArrayDecl::new("codeSize", "pCode").force_item_type(ScalarType::Uint8)),
    );
    let lines = trimmed(&lines);
    assert!(lines.contains(&"code : array<uint8>"));
    assert!(lines.contains(&"codeSize = uint64(length(boost_struct.code)),"));
    assert!(lines.contains(&"pCode = unsafe(reinterpret<uint?> array_addr_unsafe(boost_struct.code))"));
}

#[test]
fn test_optional_array_shares_count() {
    let lines = struct_lines(
        StructDecl::new("VkSubpassDescription")
            .vk_to_boost(false)
            .declare_array("colorAttachmentCount", "pColorAttachments")
            .array(ArrayDecl::new("colorAttachmentCount", "pResolveAttachments").optional()),
    );
    let lines = trimmed(&lines);
    assert!(lines.contains(
        &"assert(length(boost_struct.resolve_attachments) == 0 || length(boost_struct.resolve_attachments) == length(boost_struct.color_attachments))"
    ));
    assert!(lines.contains(&"colorAttachmentCount = uint(length(boost_struct.color_attachments)),"));
}

#[test]
fn test_struct_synthesized_s_type_must_exist() {
    let header: Header = [
        Record::enumeration("VkStructureType", ["VK_STRUCTURE_TYPE_APPLICATION_INFO"]),
        Record::structure(
            "VkFooInfo",
            [("sType", "VkStructureType"), ("pNext", "const void *")],
        ),
    ]
    .into_iter()
    .collect();
    let err = GenStruct::new(&StructDecl::new("VkFooInfo"), &header).unwrap_err();
    assert!(matches!(err, Error::Declaration { .. }), "{err}");
}

#[test]
fn test_array_declaration_errors() {
    let header = vulkan();
    let unknown = StructDecl::new("VkBufferCreateInfo").declare_array("queueFamilyIndexCount", "pIndices");
    assert!(matches!(
        GenStruct::new(&unknown, &header),
        Err(Error::Declaration { .. })
    ));
    let twice = StructDecl::new("VkBufferCreateInfo")
        .declare_array("queueFamilyIndexCount", "pQueueFamilyIndices")
        .declare_array("size", "pQueueFamilyIndices");
    assert!(matches!(
        GenStruct::new(&twice, &header),
        Err(Error::Declaration { .. })
    ));
    let not_a_pointer = StructDecl::new("VkBufferCreateInfo").declare_array("queueFamilyIndexCount", "size");
    assert!(matches!(
        GenStruct::new(&not_a_pointer, &header),
        Err(Error::Declaration { .. })
    ));
}

#[test]
fn test_ignore_field() {
    let lines = struct_lines(StructDecl::new("VkImageViewCreateInfo").ignore_field("flags"));
    assert!(!trimmed(&lines).iter().any(|l| l.contains("flags")));
    let err = GenStruct::new(
        &StructDecl::new("VkImageViewCreateInfo").ignore_field("nope"),
        &vulkan(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Declaration { .. }), "{err}");
}

// Handle generator

#[test]
fn test_handle_ctor_dtor() {
    let header: Header = [
        Record::opaque("VkFoo_T"),
        Record::typedef("VkFoo", "struct VkFoo_T *"),
        Record::structure("VkAllocationCallbacks", [("pUserData", "void *")]),
        Record::structure("VkFooCreateInfo", [("size", "uint32_t")]),
        Record::function(
            "createFoo",
            "void (const VkFooCreateInfo *, const VkAllocationCallbacks *, VkFoo *)",
            [
                ("pCreateInfo", "const VkFooCreateInfo *"),
                ALLOCATOR,
                ("pFoo", "VkFoo *"),
            ],
        ),
        Record::function(
            "destroyFoo",
            "void (VkFoo, const VkAllocationCallbacks *)",
            [("foo", "VkFoo"), ALLOCATOR],
        ),
    ]
    .into_iter()
    .collect();
    let decl = HandleDecl::new("VkFoo").ctor("createFoo").dtor("destroyFoo");
    let lines = GenHandle::new(&decl, &header, "vk", &[])
        .unwrap()
        .generate()
        .unwrap();

    assert_eq!(
        &lines[..3],
        ["struct Foo", "    foo : VkFoo", "    _needs_delete : bool"]
    );
    let ctor = position(&lines, "def create_foo(var create_info : FooCreateInfo) : Foo");
    let owned = position(&lines, "_needs_delete = true");
    assert!(ctor < owned);
    let destroy = position(&lines, "def destroy(var foo : Foo)");
    assert_eq!(
        &lines[destroy + 1..],
        [
            "    if foo._needs_delete",
            "        destroyFoo(foo.foo, null)",
            "    foo._needs_delete = false",
        ]
    );
}

#[test]
fn test_handle_captures_destructor_dependencies() {
    let lines = handle_lines(HandleDecl::new("VkImageView"));
    let lines_trimmed = trimmed(&lines);
    assert!(lines_trimmed.contains(&"_device : VkDevice"));
    assert!(lines_trimmed.contains(
        &"def create_image_view(device : Device; var create_info : ImageViewCreateInfo; var result : VkResult? = null) : ImageView"
    ));
    assert!(lines_trimmed.contains(&"var vk_create_info <- create_info |> vk_view_create_unsafe()"));
    assert!(lines_trimmed.contains(
        &"let status = vkCreateImageView(device.device, unsafe(addr(vk_create_info)), null, unsafe(addr(vk_view)))"
    ));
    assert!(lines_trimmed.contains(&"_device = device.device"));
    assert!(lines_trimmed.contains(
        &"vkDestroyImageView(image_view._device, image_view.image_view, null)"
    ));

    // the view is released by a defer block registered right after its creation
    let view = position_starting(&lines, "var vk_create_info <-");
    assert_eq!(lines[view + 1].trim(), "defer() <|");
    assert_eq!(lines[view + 2].trim(), "create_info |> vk_view_destroy()");
}

#[test]
fn test_ctor_must_capture_destructor_handles() {
    let header: Header = [
        Record::opaque("VkDevice_T"),
        Record::opaque("VkFence_T"),
        Record::function(
            "vkCreateFence",
            "VkResult (struct VkFence_T **)",
            [("pFence", "struct VkFence_T **")],
        ),
        Record::function(
            "vkDestroyFence",
            "void (struct VkDevice_T *, struct VkFence_T *)",
            [("device", "struct VkDevice_T *"), ("fence", "struct VkFence_T *")],
        ),
    ]
    .into_iter()
    .collect();
    let err = GenHandle::new(&HandleDecl::new("VkFence"), &header, "vk", &[]).unwrap_err();
    assert!(matches!(err, Error::Declaration { .. }), "{err}");
}

#[test]
fn test_enumerator_only_handle() {
    let lines = handle_lines(HandleDecl::new("VkPhysicalDevice"));
    let lines_trimmed = trimmed(&lines);
    assert!(lines_trimmed.contains(&"struct PhysicalDevice"));
    assert!(lines_trimmed.contains(&"struct PhysicalDevice_Batch"));
    assert!(lines_trimmed.contains(&"physical_devices : array<VkPhysicalDevice>"));
    assert!(lines_trimmed.contains(
        &"def enumerate_physical_devices(instance : Instance; var result : VkResult? = null) : PhysicalDevice_Batch"
    ));
    assert!(lines_trimmed.contains(
        &"def enumerate_physical_devices_no_batch(instance : Instance; var result : VkResult? = null) : array<PhysicalDevice>"
    ));
    assert!(lines_trimmed.contains(&"var batch <- enumerate_physical_devices(instance, result)"));
    assert!(lines_trimmed.contains(
        &"return <- [{for item in batch.physical_devices; [[PhysicalDevice physical_device = item]]}]"
    ));

    let defs = lines_trimmed
        .iter()
        .filter(|l| l.starts_with("def "))
        .count();
    assert_eq!(defs, 3, "boost_value_to_vk, enumerator and its flattening");
    assert!(!lines_trimmed.iter().any(|l| l.starts_with("def create") || l.starts_with("def destroy")));
    assert!(!lines_trimmed.iter().any(|l| l.contains("_needs_delete")));
}

#[test]
fn test_enumeration_two_call_order() {
    let lines = handle_lines(HandleDecl::new("VkPhysicalDevice"));
    let count = position(&lines, "var vk_physical_device_count : uint");
    let query = position(
        &lines,
        "let query_status = vkEnumeratePhysicalDevices(instance.instance, unsafe(addr(vk_physical_device_count)), null)",
    );
    let query_failed = position(&lines, "if query_status != VkResult VK_SUCCESS");
    let resize = position(&lines, "vk_physical_devices |> resize(int(vk_physical_device_count))");
    let fill = position(
        &lines,
        "let status = vkEnumeratePhysicalDevices(instance.instance, unsafe(addr(vk_physical_device_count)), array_addr_unsafe(vk_physical_devices))",
    );
    assert!(count < query);
    assert!(query < query_failed);
    assert!(query_failed < resize);
    assert!(resize < fill);
    assert_eq!(lines[query_failed + 2].trim(), "return <- [[PhysicalDevice_Batch]]");
}

#[test]
fn test_batched_ctor() {
    let decl = HandleDecl::new("VkPipeline").ctor(
        FunctionDecl::new("vkCreateGraphicsPipelines")
            .declare_array("createInfoCount", "pCreateInfos")
            .declare_array("createInfoCount", "pPipelines"),
    );
    let lines = handle_lines(decl);
    let lines = trimmed(&lines);
    assert!(lines.contains(&"struct Pipeline_Batch"));
    assert!(lines.contains(
        &"def create_graphics_pipelines(device : Device; var create_infos : array<GraphicsPipelineCreateInfo>; var result : VkResult? = null) : Pipeline_Batch"
    ));
    assert!(lines.contains(&"vk_pipelines |> resize(length(create_infos))"));
    assert!(lines.contains(
        &"let status = vkCreateGraphicsPipelines(device.device, uint(length(create_infos)), array_addr_unsafe(vk_create_infos), null, array_addr_unsafe(vk_pipelines))"
    ));
    assert!(lines.contains(&"pipelines <- vk_pipelines,"));
    assert!(lines.contains(&"var batch <- create_graphics_pipelines(device, create_infos, result)"));
    assert!(lines.contains(
        &"return <- [{for item in batch.pipelines; [[Pipeline pipeline = item, _needs_delete = batch._needs_delete, _device = batch._device]]}]"
    ));
    assert!(lines.contains(&"def destroy(var batch : Pipeline_Batch)"));
    assert!(lines.contains(&"vkDestroyPipeline(batch._device, item, null)"));
    // no size query: the count is the input length
    assert!(!lines.iter().any(|l| l.contains("query_status")));
}

// Function generator

#[test]
fn test_function_size_query() {
    let lines = function_lines(
        FunctionDecl::new("vkGetPhysicalDeviceQueueFamilyProperties")
            .declare_array("pQueueFamilyPropertyCount", "pQueueFamilyProperties")
            .declare_output("pQueueFamilyProperties"),
    );
    assert_eq!(
        trimmed(&lines),
        [
            "def get_physical_device_queue_family_properties(physical_device : PhysicalDevice) : array<QueueFamilyProperties>",
            "var vk_queue_family_properties : array<VkQueueFamilyProperties>",
            "var vk_queue_family_property_count : uint",
            "vkGetPhysicalDeviceQueueFamilyProperties(physical_device.physical_device, unsafe(addr(vk_queue_family_property_count)), null)",
            "vk_queue_family_properties |> resize(int(vk_queue_family_property_count))",
            "vkGetPhysicalDeviceQueueFamilyProperties(physical_device.physical_device, unsafe(addr(vk_queue_family_property_count)), array_addr_unsafe(vk_queue_family_properties))",
            "vk_queue_family_properties |> resize(int(vk_queue_family_property_count))",
            "return <- [{for item in vk_queue_family_properties; item |> vk_value_to_boost()}]",
        ]
    );
}

#[test]
fn test_function_single_output() {
    let lines = function_lines(
        FunctionDecl::new("vkGetPhysicalDeviceProperties").declare_output("pProperties"),
    );
    assert_eq!(
        lines,
        [
            "def get_physical_device_properties(physical_device : PhysicalDevice) : PhysicalDeviceProperties",
            "    var vk_properties : VkPhysicalDeviceProperties",
            "    vkGetPhysicalDeviceProperties(physical_device.physical_device, unsafe(addr(vk_properties)))",
            "    return <- vk_properties |> vk_value_to_boost()",
        ]
    );
}

#[test]
fn test_function_status_only() {
    let lines = function_lines(FunctionDecl::new("vkDeviceWaitIdle"));
    assert_eq!(
        trimmed(&lines),
        [
            "def device_wait_idle(device : Device; var result : VkResult? = null)",
            "let status = vkDeviceWaitIdle(device.device)",
            "if result != null",
            "*result = status",
            "if status != VkResult VK_SUCCESS",
            "assert(result != null, \"vkDeviceWaitIdle failed\")",
            "return",
        ]
    );
}

#[test]
fn test_multiple_outputs() {
    let header = vulkan();
    let two = FunctionDecl::new("vkGetTwoCounts")
        .declare_output("pFirst")
        .declare_output("pSecond");
    let function = header.function("vkGetTwoCounts").unwrap();
    assert!(matches!(
        GenFunction::new(function, &two, &header),
        Err(Error::MultipleOutputs { .. })
    ));

    let value_and_output = FunctionDecl::new("vkGetCountAndValue").declare_output("pValue");
    let function = header.function("vkGetCountAndValue").unwrap();
    assert!(matches!(
        GenFunction::new(function, &value_and_output, &header),
        Err(Error::MultipleOutputs { .. })
    ));
}

#[test]
fn test_function_with_unknown_return_type() {
    let header = vulkan();
    let function = header.function("vkGetDeviceProcAddr").unwrap();
    let err = GenFunction::new(function, &FunctionDecl::new("vkGetDeviceProcAddr"), &header)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownType { .. }), "{err}");
}

// Generator

#[test]
fn test_generator_output_order() {
    let lines = Generator::builder()
        .module("vulkan_boost")
        .handle(HandleDecl::new("VkInstance"))
        .handle(HandleDecl::new("VkPhysicalDevice"))
        .structure(StructDecl::new("VkPhysicalDeviceProperties").boost_to_vk(false))
        .function(FunctionDecl::new("vkGetPhysicalDeviceProperties").declare_output("pProperties"))
        .build(&vulkan())
        .unwrap()
        .generate()
        .unwrap();
    assert_eq!(lines[0], GENERATED_MARKER);
    let module = position(&lines, "module vulkan_boost");
    let require = position(&lines, "require vulkan");
    let function = position_starting(&lines, "def get_physical_device_properties(");
    let structure = position(&lines, "struct PhysicalDeviceProperties");
    let handle = position(&lines, "struct Instance");
    assert!(module < require);
    assert!(require < function);
    assert!(function < structure);
    assert!(structure < handle);
    assert!(lines[structure - 1].is_empty());
}

#[test]
fn test_generator_missing_dependencies() {
    let header = vulkan();
    let err = Generator::builder()
        .handle(HandleDecl::new("VkPhysicalDevice"))
        .handle(HandleDecl::new("VkInstance"))
        .function(FunctionDecl::new("vkGetPhysicalDeviceProperties").declare_output("pProperties"))
        .build(&header)
        .unwrap_err();
    match err {
        Error::MissingDependency { dependency, .. } => {
            assert_eq!(dependency, "VkPhysicalDeviceProperties")
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = Generator::builder()
        .handle(HandleDecl::new("VkDevice"))
        .handle(HandleDecl::new("VkImage"))
        .handle(HandleDecl::new("VkImageView"))
        .structure(StructDecl::new("VkImageViewCreateInfo").boost_to_vk(false))
        .build(&header)
        .unwrap_err();
    assert!(
        matches!(&err, Error::MissingDependency { dependency, .. } if dependency == "VkImageViewCreateInfo"),
        "{err}"
    );

    let err = Generator::builder()
        .structure(StructDecl::new("VkImageViewCreateInfo"))
        .build(&header)
        .unwrap_err();
    assert!(
        matches!(&err, Error::MissingDependency { dependency, .. } if dependency == "VkImage"),
        "{err}"
    );
}

#[test]
fn test_generator_rejects_duplicates_and_missing_entities() {
    let header = vulkan();
    let err = Generator::builder()
        .structure(StructDecl::new("VkExtent2D"))
        .structure(StructDecl::new("VkExtent2D"))
        .build(&header)
        .unwrap_err();
    assert!(matches!(err, Error::Declaration { .. }), "{err}");

    let err = Generator::builder()
        .function("vkQueuePresentKHR")
        .build(&header)
        .unwrap_err();
    assert!(matches!(err, Error::MissingEntity { kind: "function", .. }), "{err}");

    let err = Generator::builder()
        .handle(HandleDecl::new("VkSemaphore"))
        .build(&header)
        .unwrap_err();
    assert!(matches!(err, Error::MissingEntity { kind: "handle", .. }), "{err}");
}

#[test]
fn test_declared_function_is_not_discovered_as_lifecycle() {
    let lines = Generator::builder()
        .handle(HandleDecl::new("VkInstance"))
        .handle(HandleDecl::new("VkPhysicalDevice"))
        .function(
            FunctionDecl::new("vkEnumeratePhysicalDevices")
                .declare_array("pPhysicalDeviceCount", "pPhysicalDevices")
                .declare_output("pPhysicalDevices"),
        )
        .build(&vulkan())
        .unwrap()
        .generate()
        .unwrap();
    let definitions = lines
        .iter()
        .map(String::as_str)
        .filter(|l| l.starts_with("def enumerate_physical_devices"))
        .collect::<Vec<_>>();
    assert_eq!(
        definitions,
        ["def enumerate_physical_devices(instance : Instance; var result : VkResult? = null) : array<PhysicalDevice>"]
    );
    assert!(!lines.iter().any(|l| l.contains("PhysicalDevice_Batch")));
}

#[test]
fn test_generator_rejects_colliding_wrappers() {
    let err = Generator::builder()
        .handle(HandleDecl::new("VkDevice"))
        .handle(HandleDecl::new("VkImage"))
        .handle(HandleDecl::new("VkImageView").ctor("vkCreateImageView"))
        .structure(StructDecl::new("VkImageViewCreateInfo"))
        .function(FunctionDecl::new("vkCreateImageView").declare_output("pView"))
        .build(&vulkan())
        .unwrap_err();
    assert!(
        matches!(
            &err,
            Error::Declaration { unit, message }
                if unit == "VkImageView"
                    && message.contains("create_image_view(Device; ImageViewCreateInfo; VkResult?)")
        ),
        "{err}"
    );
}

#[test]
fn test_generator_filter_applies_before_sealing() {
    let header = vulkan();
    let filter = crate::api::filter::Filter::builder()
        .ignore_function("vkDestroyPipeline")
        .build();
    let generator = Generator::builder()
        .filter(filter)
        .handle(HandleDecl::new("VkDevice"))
        .handle(HandleDecl::new("VkPipeline").ctor(
            FunctionDecl::new("vkCreateGraphicsPipelines")
                .declare_array("createInfoCount", "pCreateInfos")
                .declare_array("createInfoCount", "pPipelines"),
        ))
        .structure(StructDecl::new("VkGraphicsPipelineCreateInfo"))
        .build(&header)
        .unwrap();
    let pipeline = &generator.handles()[1];
    assert!(!pipeline.has_dtor());
}
