// ==========================================
// 测试数据生成器
// ==========================================
// 用途: 生成主数据导入用的CSV测试数据集
// 输出: tests/fixtures/datasets/*.csv
// ==========================================

use csv::Writer;
use std::error::Error;
use std::fs::File;

// 物料 CSV 表头
const ITEM_HEADER: &[&str] = &["sku", "name", "uom"];

// 库位 CSV 表头
const LOCATION_HEADER: &[&str] = &["code", "name", "type", "active"];

// 物料记录
#[derive(Clone)]
struct ItemRecord {
    sku: String,
    name: String,
    uom: String,
}

impl ItemRecord {
    fn to_row(&self) -> Vec<String> {
        vec![self.sku.clone(), self.name.clone(), self.uom.clone()]
    }
}

// 库位记录
#[derive(Clone)]
struct LocationRecord {
    code: String,
    name: String,
    location_type: String,
    active: String,
}

impl LocationRecord {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.name.clone(),
            self.location_type.clone(),
            self.active.clone(),
        ]
    }
}

// 生成正常物料记录
fn generate_item(index: usize) -> ItemRecord {
    ItemRecord {
        sku: format!("SKU{:06}", index + 1),
        name: format!("测试物料 {:06}", index + 1),
        uom: ["EA", "BOX", "KG", "PAL"][index % 4].to_string(),
    }
}

// 生成正常库位记录
fn generate_location(index: usize) -> LocationRecord {
    let location_type = ["PICK", "BULK", "STAGING", "DOCK"][index % 4];
    LocationRecord {
        code: format!("LOC-{:04}", index + 1),
        name: format!("库位 {:04}", index + 1),
        location_type: location_type.to_string(),
        active: ["true", "1", "yes"][index % 3].to_string(),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("开始生成测试数据集...");

    // 1. 正常物料数据 (100条)
    generate_items_normal()?;

    // 2. 大物料数据集 (1000条)
    generate_items_large()?;

    // 3. 缺失必填字段的物料数据
    generate_items_missing_sku()?;

    // 4. 正常库位数据
    generate_locations_normal()?;

    // 5. 标志位/类型异常的库位数据
    generate_locations_bad_values()?;

    // 6. 混合问题数据
    generate_locations_mixed()?;

    println!("✓ 所有测试数据集生成完成！");
    Ok(())
}

fn generate_items_normal() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/01_items_normal.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(ITEM_HEADER)?;

    for i in 0..100 {
        let record = generate_item(i);
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ 生成 01_items_normal.csv (100条)");
    Ok(())
}

fn generate_items_large() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/02_items_large.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(ITEM_HEADER)?;

    for i in 0..1000 {
        let record = generate_item(i + 10000); // 避免与其他数据集冲突
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ 生成 02_items_large.csv (1000条)");
    Ok(())
}

fn generate_items_missing_sku() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/03_items_missing_sku.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(ITEM_HEADER)?;

    // 缺失 sku
    for i in 0..3 {
        let mut record = generate_item(i + 20000);
        record.sku = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // 缺失名称与计量单位 (应回落到默认值)
    for i in 0..3 {
        let mut record = generate_item(i + 20003);
        record.name = "".to_string();
        record.uom = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // 正常数据 (对照组)
    for i in 0..4 {
        let record = generate_item(i + 20006);
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ 生成 03_items_missing_sku.csv (10条，含缺失字段)");
    Ok(())
}

fn generate_locations_normal() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/04_locations_normal.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(LOCATION_HEADER)?;

    for i in 0..50 {
        let record = generate_location(i);
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ 生成 04_locations_normal.csv (50条)");
    Ok(())
}

fn generate_locations_bad_values() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/05_locations_bad_values.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(LOCATION_HEADER)?;

    // 未知库位类型
    for i in 0..3 {
        let mut record = generate_location(i + 30000);
        record.location_type = "MEZZANINE".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // active 无法解析
    for i in 0..3 {
        let mut record = generate_location(i + 30003);
        record.active = "maybe".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // 缺失 code
    for i in 0..2 {
        let mut record = generate_location(i + 30006);
        record.code = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // 正常数据 (对照组)
    for i in 0..2 {
        let record = generate_location(i + 30008);
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ 生成 05_locations_bad_values.csv (10条，含异常值)");
    Ok(())
}

fn generate_locations_mixed() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/06_locations_mixed.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(LOCATION_HEADER)?;

    // 正常数据 (10条)
    for i in 0..10 {
        let record = generate_location(i + 40000);
        wtr.write_record(&record.to_row())?;
    }

    // 同 code 重复 (5条, 导入应按更新处理)
    for i in [0, 2, 4, 6, 8] {
        let mut record = generate_location(i + 40000);
        record.name = format!("{} (更新)", record.name);
        wtr.write_record(&record.to_row())?;
    }

    // 类型/标志位留空 (应回落到默认值)
    for i in 0..5 {
        let mut record = generate_location(i + 40010);
        record.location_type = "".to_string();
        record.active = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ 生成 06_locations_mixed.csv (20条，混合问题)");
    Ok(())
}
